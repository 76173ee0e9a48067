//! Human-readable listing of registry contents.

use crate::definition::Category;
use crate::definitions::Definitions;
use crate::registry::Registry;
use std::fmt::Write;

impl Definitions {
    /// Render every non-empty category as C-like text
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for category in Category::ALL {
            if self.names(category).is_empty() {
                continue;
            }
            let _ = writeln!(out, "// {category}");
            self.dump_category(category, &mut out);
            out.push('\n');
        }
        out
    }

    fn dump_category(&self, category: Category, out: &mut String) {
        match category {
            Category::Macros => {
                for (name, m) in &self.macros {
                    let _ = writeln!(out, "#define {name} {}", m.content());
                }
            }
            Category::FnMacros => {
                for (name, m) in &self.fnmacros {
                    let _ = writeln!(out, "#define {name}({}) {}", m.params().join(", "), m.content());
                }
            }
            Category::Types => {
                for (name, ty) in &self.types {
                    let _ = writeln!(out, "{name}: {ty}");
                }
            }
            Category::Variables => {
                for (name, var) in &self.variables {
                    let decl = var.ty.c_repr(Some(name.as_str()));
                    match &var.value {
                        Some(value) => {
                            let _ = writeln!(out, "{decl} = {value};");
                        }
                        None => {
                            let _ = writeln!(out, "{decl};");
                        }
                    }
                }
            }
            Category::Functions => {
                for (name, func) in &self.functions {
                    let _ = writeln!(out, "{};", func.ty().c_repr(Some(name.as_str())));
                }
            }
            Category::Structs => {
                for (name, compound) in &self.structs {
                    let _ = writeln!(out, "{};", compound.c_repr("struct", name));
                }
            }
            Category::Unions => {
                for (name, compound) in &self.unions {
                    let _ = writeln!(out, "{};", compound.c_repr("union", name));
                }
            }
            Category::Enums => {
                for (name, def) in &self.enums {
                    let _ = writeln!(out, "{};", def.c_repr(name));
                }
            }
            Category::Values => {
                for (name, value) in &self.values {
                    let _ = writeln!(out, "{name} = {value}");
                }
            }
        }
    }
}

impl Registry {
    /// Listing of the flat view, or of one file's definitions
    pub fn dump(&self, file: Option<&str>) -> String {
        match file {
            Some(file) => self.file_view(file).map(Definitions::dump).unwrap_or_default(),
            None => self.flat().dump(),
        }
    }
}
