//! Rendering types back to C declaration syntax.

use crate::ty::{FunctionSig, Modifier, Type};

impl Type {
    /// Render as a C declaration of `referrer`, or as an abstract type name
    /// when no referrer is given.
    ///
    /// Modifiers wrap the referrer from the outermost inward; a pointer
    /// wrapped by an array or parameter list is parenthesized.
    pub fn c_repr(&self, referrer: Option<&str>) -> String {
        let mut inner = referrer.unwrap_or("").to_string();
        let mut indirect = false;

        for (level, modifier) in self.declarators().iter().enumerate().rev() {
            let quals = &self.qualifiers()[level + 1];
            match modifier {
                Modifier::Pointer | Modifier::Reference => {
                    let mark = if matches!(modifier, Modifier::Pointer) { '*' } else { '&' };
                    inner = match (quals.is_empty(), inner.is_empty()) {
                        (true, _) => format!("{mark}{inner}"),
                        (false, true) => format!("{mark} {quals}"),
                        (false, false) => format!("{mark} {quals} {inner}"),
                    };
                    indirect = true;
                }
                Modifier::Array(size) => {
                    if indirect {
                        inner = format!("({inner})");
                    }
                    match size {
                        Some(n) => inner.push_str(&format!("[{n}]")),
                        None => inner.push_str("[]"),
                    }
                    indirect = false;
                }
                Modifier::Function(sig) => {
                    // calling conventions sit in front of the declarator
                    if !quals.is_empty() {
                        inner = if inner.is_empty() {
                            quals.to_string()
                        } else {
                            format!("{quals} {inner}")
                        };
                    }
                    if indirect {
                        inner = format!("({inner})");
                    }
                    inner.push_str(&render_params(sig));
                    indirect = false;
                }
            }
        }

        let base_quals = self.base_qualifiers();
        let mut out = String::new();
        if !base_quals.is_empty() {
            out.push_str(&base_quals.to_string());
            out.push(' ');
        }
        out.push_str(self.base_name());
        if !inner.is_empty() {
            out.push(' ');
            out.push_str(&inner);
        }
        out
    }
}

fn render_params(sig: &FunctionSig) -> String {
    let mut parts: Vec<String> = sig
        .params
        .iter()
        .map(|p| p.ty.c_repr(p.name.as_deref()))
        .collect();
    if sig.variadic {
        parts.push("...".to_string());
    }
    format!("({})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Param;

    #[test]
    fn test_pointer_and_array_precedence() {
        let array_of_ptrs = Type::new("int").pointer().array(Some(2));
        assert_eq!(array_of_ptrs.c_repr(Some("a")), "int *a[2]");

        let ptr_to_array = Type::new("int").array(Some(2)).pointer();
        assert_eq!(ptr_to_array.c_repr(Some("a")), "int (*a)[2]");
    }

    #[test]
    fn test_multi_dimensional_array() {
        let ty = Type::new("char").array(Some(20)).array(Some(10));
        assert_eq!(ty.c_repr(Some("str")), "char str[10][20]");
        assert_eq!(Type::new("int").array(None).c_repr(Some("x")), "int x[]");
    }

    #[test]
    fn test_function_types() {
        let sig = FunctionSig::new(vec![Param::new(Some("x"), Type::new("int"))]);
        assert_eq!(Type::new("char").function(sig).c_repr(Some("fn")), "char fn(int x)");

        let sig = FunctionSig::new(vec![
            Param::new(None, Type::new("int")),
            Param::new(None, Type::new("int").pointer()),
        ]);
        let fn_ptr = Type::new("struct s").function(sig).pointer();
        assert_eq!(fn_ptr.c_repr(None), "struct s (*)(int, int *)");

        let variadic = Type::new("int").function(FunctionSig::new(vec![Param::new(Some("fmt"), Type::new("char").pointer())]).variadic());
        insta::assert_snapshot!(variadic.c_repr(Some("printf")), @"int printf(char *fmt, ...)");
    }

    #[test]
    fn test_qualifiers() {
        let ty = Type::new("int").qualified(["const"]).pointer().qualified(["const"]);
        assert_eq!(ty.c_repr(Some("p")), "const int * const p");
        assert_eq!(ty.c_repr(None), "const int * const");
        assert_eq!(Type::new("int").reference().c_repr(Some("r")), "int &r");
    }

    #[test]
    fn test_pointer_to_function_returning_pointer() {
        let ty = Type::new("int")
            .pointer()
            .function(FunctionSig::new(vec![Param::new(None, Type::new("int"))]))
            .pointer();
        assert_eq!(ty.c_repr(Some("f")), "int *(*f)(int)");
    }

    #[test]
    fn test_calling_convention_placement() {
        let sig = FunctionSig::new(vec![Param::new(None, Type::new("int"))]);
        let callback = Type::new("void").function(sig).qualified(["__stdcall"]).pointer();
        assert_eq!(callback.c_repr(Some("cb")), "void (__stdcall *cb)(int)");
    }
}
