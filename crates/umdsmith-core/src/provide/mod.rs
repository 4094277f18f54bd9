//! Dependency Provider Resolver.
//!
//! Decides, per loader branch, where the value of each declared dependency
//! comes from and emits the statements that put it on the runtime's `lib`
//! namespace.

pub mod path;

use crate::bundler::PackageBundler;
use crate::errors::{BundleError, CompileError};
use path::{js_string, subscript_chain};
use std::path::Path;
use tracing::debug;

/// Name of the function the bundle wrapper exposes.
pub const BUNDLE_REQUIRE: &str = "__umdRequire";

/// Root identifier of the ambient global object inside the emitted closure.
pub const GLOBAL_ROOT: &str = "global";

/// Prefix of the named-module handler parameters (`__dep0`, `__dep1`, ...)
pub const DEP_PARAM_PREFIX: &str = "__dep";

/// Whether `name` has the shape of a generated handler parameter
pub fn is_dep_param(name: &str) -> bool {
    name.strip_prefix(DEP_PARAM_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// One way of obtaining a dependency value at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Package bundled at build time and required from the bundle.
    Bundled { package: String },
    /// Declared dependency of the named-module system.
    NamedModule { module: String },
    /// Value read off the global object along a fixed path.
    GlobalPath { segments: Vec<String> },
}

impl Provider {
    fn kind(&self) -> &'static str {
        match self {
            Provider::Bundled { .. } => "commonJS",
            Provider::NamedModule { .. } => "ym",
            Provider::GlobalPath { .. } => "globals",
        }
    }
}

/// Loader convention the emitted module may find itself in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    NamedModule,
    CommonJs,
    Global,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::NamedModule, Branch::CommonJs, Branch::Global];

    /// Pick the provider used in this branch, if any applies.
    ///
    /// Module-system branches prefer their native provider and fall back to
    /// a global path. The global branch prefers a global path and falls back
    /// to the bundled copy.
    pub fn select(self, providers: &[Provider]) -> Option<&Provider> {
        let is_named: fn(&Provider) -> bool = |p| matches!(p, Provider::NamedModule { .. });
        let is_bundled: fn(&Provider) -> bool = |p| matches!(p, Provider::Bundled { .. });
        let is_global: fn(&Provider) -> bool = |p| matches!(p, Provider::GlobalPath { .. });

        let preference = match self {
            Branch::NamedModule => [is_named, is_global],
            Branch::CommonJs => [is_bundled, is_global],
            Branch::Global => [is_global, is_bundled],
        };
        preference
            .iter()
            .find_map(|wanted| providers.iter().find(|p| wanted(p)))
    }
}

/// A named dependency with its providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    providers: Vec<Provider>,
}

impl Requirement {
    /// Validate and build a requirement.
    ///
    /// At least one provider is needed, and at most one of each kind.
    pub fn new(name: impl Into<String>, providers: Vec<Provider>) -> Result<Self, CompileError> {
        let name = name.into();
        let invalid = |reason: String| CompileError::InvalidRequire {
            name: name.clone(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("dependency name cannot be empty".to_string()));
        }
        if providers.is_empty() {
            return Err(invalid(
                "at least one of `globals`, `commonJS` or `ym` is required".to_string(),
            ));
        }

        for (i, provider) in providers.iter().enumerate() {
            if providers[..i].iter().any(|p| p.kind() == provider.kind()) {
                return Err(invalid(format!("`{}` is given more than once", provider.kind())));
            }
            let empty = match provider {
                Provider::Bundled { package } => package.trim().is_empty(),
                Provider::NamedModule { module } => module.trim().is_empty(),
                Provider::GlobalPath { segments } => {
                    segments.is_empty() || segments.iter().any(|s| s.is_empty())
                }
            };
            if empty {
                return Err(invalid(format!("`{}` cannot be empty", provider.kind())));
            }
        }

        Ok(Self { name, providers })
    }

    pub fn global(name: impl Into<String>, dotted: &str) -> Result<Self, CompileError> {
        let name = name.into();
        let segments = path::split_dotted(dotted).ok_or_else(|| CompileError::InvalidRequire {
            name: name.clone(),
            reason: format!("invalid global path `{dotted}`"),
        })?;
        Self::new(name, vec![Provider::GlobalPath { segments }])
    }

    pub fn bundled(name: impl Into<String>, package: impl Into<String>) -> Result<Self, CompileError> {
        Self::new(
            name,
            vec![Provider::Bundled {
                package: package.into(),
            }],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }
}

/// Bundled dependency provisioning.
///
/// `bundle` is the wrapped bundle text, written verbatim once ahead of the
/// loader branches; `assignments` are the CommonJS branch's single-line
/// statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonJsProvision {
    pub bundle: Option<String>,
    pub assignments: Vec<String>,
}

/// Named-module definition: declared module names plus the handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedModuleDefinition {
    pub modules: Vec<String>,
    pub params: Vec<String>,
    pub assignments: Vec<String>,
}

/// Resolves a `requires` list against each loader branch.
///
/// Statement order always follows declaration order.
pub struct ProviderResolver<'a> {
    requires: &'a [Requirement],
    runtime_var: &'a str,
}

impl<'a> ProviderResolver<'a> {
    pub fn new(requires: &'a [Requirement], runtime_var: &'a str) -> Self {
        Self {
            requires,
            runtime_var,
        }
    }

    /// Package specifiers to bundle, de-duplicated, in declaration order.
    pub fn bundled_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for req in self.requires {
            if let Some(Provider::Bundled { package }) = Branch::CommonJs.select(&req.providers) {
                if !packages.contains(package) {
                    packages.push(package.clone());
                }
            }
        }
        packages
    }

    /// Build the CommonJS provisioning, invoking the bundler only if at
    /// least one requirement is bundled.
    pub fn common_js(
        &self,
        bundler: &dyn PackageBundler,
        basedir: &Path,
    ) -> Result<CommonJsProvision, BundleError> {
        let packages = self.bundled_packages();

        let bundle = if packages.is_empty() {
            debug!("No bundled dependencies, skipping bundler");
            None
        } else {
            debug!("Bundling {} package(s)", packages.len());
            let text = bundler.bundle(basedir, &packages)?;
            Some(wrap_bundle(&text))
        };

        let assignments = self.assignments(Branch::CommonJs, |_| None);

        Ok(CommonJsProvision {
            bundle,
            assignments,
        })
    }

    /// Assignments for the global-fallback branch; bundled dependencies
    /// without a global path are required from the shared bundle.
    pub fn global_assignments(&self) -> Vec<String> {
        self.assignments(Branch::Global, |_| None)
    }

    /// Module definition for the named-module branch.
    pub fn named_module(&self) -> NamedModuleDefinition {
        let mut modules = Vec::new();
        let mut params = Vec::new();
        let mut named_params: Vec<(String, String)> = Vec::new();

        for req in self.requires {
            if let Some(Provider::NamedModule { module }) = Branch::NamedModule.select(&req.providers)
            {
                let param = format!("{}{}", DEP_PARAM_PREFIX, params.len());
                modules.push(module.clone());
                params.push(param.clone());
                named_params.push((req.name.clone(), param));
            }
        }

        let assignments = self.assignments(Branch::NamedModule, |name| {
            named_params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, p)| p.clone())
        });

        NamedModuleDefinition {
            modules,
            params,
            assignments,
        }
    }

    /// One assignment per requirement that has a provider in `branch`.
    ///
    /// `named_param` maps a requirement name to the handler parameter that
    /// carries its named-module value.
    fn assignments<F>(&self, branch: Branch, named_param: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = Vec::new();
        for req in self.requires {
            let value = match branch.select(&req.providers) {
                Some(Provider::GlobalPath { segments }) => subscript_chain(GLOBAL_ROOT, segments),
                Some(Provider::Bundled { package }) => {
                    format!("{}({})", BUNDLE_REQUIRE, js_string(package))
                }
                Some(Provider::NamedModule { .. }) => match named_param(&req.name) {
                    Some(param) => param,
                    None => continue,
                },
                None => continue,
            };
            out.push(format!(
                "{}.lib[{}] = {};",
                self.runtime_var,
                js_string(&req.name),
                value
            ));
        }
        out
    }
}

/// Isolate the bundle in its own scope and hand back its `require`.
fn wrap_bundle(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 96);
    out.push_str("var ");
    out.push_str(BUNDLE_REQUIRE);
    out.push_str(" = (function () {\n");
    out.push_str("var require;\n");
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("return require;\n");
    out.push_str("})();\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jquery() -> Requirement {
        Requirement::new(
            "jquery",
            vec![
                Provider::GlobalPath {
                    segments: vec!["jQuery".to_string()],
                },
                Provider::NamedModule {
                    module: "jquery".to_string(),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_prefers_branch_native_provider() {
        let req = Requirement::new(
            "lodash",
            vec![
                Provider::GlobalPath {
                    segments: vec!["_".to_string()],
                },
                Provider::Bundled {
                    package: "lodash".to_string(),
                },
                Provider::NamedModule {
                    module: "lodash".to_string(),
                },
            ],
        )
        .unwrap();

        assert!(matches!(
            Branch::CommonJs.select(req.providers()),
            Some(Provider::Bundled { .. })
        ));
        assert!(matches!(
            Branch::NamedModule.select(req.providers()),
            Some(Provider::NamedModule { .. })
        ));
        assert!(matches!(
            Branch::Global.select(req.providers()),
            Some(Provider::GlobalPath { .. })
        ));
    }

    #[test]
    fn test_select_global_path_fallback() {
        let req = Requirement::global("jquery", "jQuery").unwrap();
        for branch in Branch::ALL {
            assert!(matches!(
                branch.select(req.providers()),
                Some(Provider::GlobalPath { .. })
            ));
        }
    }

    #[test]
    fn test_select_bundled_only() {
        let req = Requirement::bundled("lodash", "lodash").unwrap();
        assert!(matches!(
            Branch::Global.select(req.providers()),
            Some(Provider::Bundled { .. })
        ));
        assert!(Branch::NamedModule.select(req.providers()).is_none());
    }

    #[test]
    fn test_is_dep_param() {
        assert!(is_dep_param("__dep0"));
        assert!(is_dep_param("__dep12"));
        assert!(!is_dep_param("__dep"));
        assert!(!is_dep_param("__depx"));
        assert!(!is_dep_param("dep0"));
    }

    #[test]
    fn test_requirement_rejects_empty_and_duplicate_providers() {
        assert!(matches!(
            Requirement::new("x", vec![]),
            Err(CompileError::InvalidRequire { .. })
        ));
        assert!(Requirement::new(
            "x",
            vec![
                Provider::Bundled {
                    package: "a".to_string()
                },
                Provider::Bundled {
                    package: "b".to_string()
                },
            ],
        )
        .is_err());
        assert!(Requirement::bundled("x", "  ").is_err());
        assert!(Requirement::global("x", "a..b").is_err());
    }

    #[test]
    fn test_named_module_definition() {
        let requires = vec![jquery(), Requirement::global("ymaps", "ya.maps").unwrap()];
        let resolver = ProviderResolver::new(&requires, "bt");

        let def = resolver.named_module();
        assert_eq!(def.modules, vec!["jquery".to_string()]);
        assert_eq!(def.params, vec!["__dep0".to_string()]);
        assert_eq!(
            def.assignments,
            vec![
                "bt.lib[\"jquery\"] = __dep0;".to_string(),
                "bt.lib[\"ymaps\"] = global[\"ya\"][\"maps\"];".to_string(),
            ]
        );
    }

    #[test]
    fn test_global_assignments_fall_back_to_bundle() {
        let requires = vec![
            Requirement::bundled("lodash", "lodash").unwrap(),
            jquery(),
        ];
        let resolver = ProviderResolver::new(&requires, "bt");

        assert_eq!(
            resolver.global_assignments(),
            vec![
                "bt.lib[\"lodash\"] = __umdRequire(\"lodash\");".to_string(),
                "bt.lib[\"jquery\"] = global[\"jQuery\"];".to_string(),
            ]
        );
    }

    #[test]
    fn test_bundled_packages_dedup_in_order() {
        let requires = vec![
            Requirement::bundled("b", "pkg-b").unwrap(),
            Requirement::bundled("a", "pkg-a").unwrap(),
            Requirement::bundled("b2", "pkg-b").unwrap(),
        ];
        let resolver = ProviderResolver::new(&requires, "bt");

        assert_eq!(
            resolver.bundled_packages(),
            vec!["pkg-b".to_string(), "pkg-a".to_string()]
        );
    }

    #[test]
    fn test_wrap_bundle_isolates_require() {
        let wrapped = wrap_bundle("require=function(n){return n;}");
        assert!(wrapped.starts_with("var __umdRequire = (function () {\nvar require;\n"));
        assert!(wrapped.ends_with("return require;\n})();\n"));
    }
}
