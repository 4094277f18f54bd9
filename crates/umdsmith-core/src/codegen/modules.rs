//! Three-branch export wrapper: named modules, CommonJS, global fallback.

use super::{ModuleEmitter, INIT_FN};
use crate::provide::path::{js_string, subscript_chain};
use crate::provide::{CommonJsProvision, ProviderResolver, GLOBAL_ROOT};

/// Flag that keeps the global branch from running after a module system
/// already took the runtime.
const DEFINE_AS_GLOBAL: &str = "__umdDefineAsGlobal";

impl ModuleEmitter<'_> {
    pub(crate) fn emit_exports(
        &mut self,
        resolver: &ProviderResolver<'_>,
        provision: &CommonJsProvision,
    ) {
        self.line(&format!("var {} = true;", DEFINE_AS_GLOBAL));
        if let Some(bundle) = &provision.bundle {
            // Shared by the CommonJS and global branches, not re-indented
            self.write(bundle);
        }
        self.emit_named_module_branch(resolver);
        self.emit_common_js_branch(provision);
        self.emit_global_branch(resolver);
    }

    fn emit_named_module_branch(&mut self, resolver: &ProviderResolver<'_>) {
        let options = self.options;
        let canonical = js_string(&options.export_name);
        let runtime = options.runtime_var.as_str();
        let def = resolver.named_module();

        self.line("if (typeof modules === \"object\") {");
        self.indent();

        let deps: Vec<String> = def.modules.iter().map(|m| js_string(m)).collect();
        let mut params = vec!["provide".to_string()];
        params.extend(def.params.iter().cloned());

        self.line(&format!(
            "modules.define({}, [{}], function ({}) {{",
            canonical,
            deps.join(", "),
            params.join(", ")
        ));
        self.indent();
        for assignment in &def.assignments {
            self.line(assignment);
        }
        self.line(&format!("{}();", INIT_FN));
        self.line(&format!("provide({});", runtime));
        self.dedent();
        self.line("});");

        for alias in options.effective_aliases() {
            self.line(&format!(
                "modules.define({}, [{}], function (provide, runtime) {{",
                js_string(alias),
                canonical
            ));
            self.indent();
            self.line("provide(runtime);");
            self.dedent();
            self.line("});");
        }

        self.line(&format!("{} = false;", DEFINE_AS_GLOBAL));
        self.dedent();
    }

    fn emit_common_js_branch(&mut self, provision: &CommonJsProvision) {
        let options = self.options;
        let runtime = options.runtime_var.as_str();

        self.line("} else if (typeof exports === \"object\") {");
        self.indent();

        for assignment in &provision.assignments {
            self.line(assignment);
        }
        self.line(&format!("{}();", INIT_FN));
        for alias in options.effective_aliases() {
            self.line(&format!("{}[{}] = {};", runtime, js_string(alias), runtime));
        }
        self.line(&format!("module.exports = {};", runtime));
        self.line(&format!("{} = false;", DEFINE_AS_GLOBAL));

        self.dedent();
        self.line("}");
    }

    fn emit_global_branch(&mut self, resolver: &ProviderResolver<'_>) {
        let options = self.options;
        let runtime = options.runtime_var.as_str();

        self.line(&format!("if ({}) {{", DEFINE_AS_GLOBAL));
        self.indent();

        for assignment in resolver.global_assignments() {
            self.line(&assignment);
        }
        self.line(&format!("{}();", INIT_FN));

        let canonical = std::iter::once(options.export_name.as_str());
        for name in canonical.chain(options.effective_aliases()) {
            let target = subscript_chain(GLOBAL_ROOT, &[name.to_string()]);
            self.line(&format!("{} = {};", target, runtime));
        }

        self.dedent();
        self.line("}");
    }
}
