//! User-supplied rewrite hooks and the serialization options record.

use skyhook_core::{JsValue, SkyhookError, SkyhookResult};
use skyhook_parser::ast::Program;
use skyhook_parser::FunctionNode;
use std::fmt;

/// A syntactic rewrite applied to a function before or after free-variable
/// analysis.
pub trait AstTransform {
    /// Name used in error reporting.
    fn name(&self) -> &str {
        "<anonymous>"
    }

    /// Rewrite the function node in place. `file` is the containing
    /// source-file tree, available as surrounding context.
    fn apply(&self, func: &mut FunctionNode, file: &mut Program) -> SkyhookResult<()>;
}

/// Hook replacing a value before the serializer looks it up in its cache.
pub type PreSerializeValue = Box<dyn Fn(&JsValue) -> JsValue>;

/// Configuration of one `serialize` call.
///
/// `pre_serialize_value` runs before the identity-cache lookup, so a
/// replacement value's identity is what gets deduplicated from then on.
#[derive(Default)]
pub struct SerializeOptions {
    /// Rewrites applied before free-variable analysis.
    pub pre_process: Vec<Box<dyn AstTransform>>,
    /// Rewrites applied after analysis, before emission.
    pub post_process: Vec<Box<dyn AstTransform>>,
    /// Value replacement hook.
    pub pre_serialize_value: Option<PreSerializeValue>,
    /// Export `handler` as the result of calling the root function once at
    /// module load.
    pub is_factory_function: bool,
    /// Fail on free variables that resolve to no enclosing scope instead
    /// of leaving the identifier in place.
    pub strict: bool,
}

impl fmt::Debug for SerializeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeOptions")
            .field("pre_process", &self.pre_process.len())
            .field("post_process", &self.post_process.len())
            .field("pre_serialize_value", &self.pre_serialize_value.is_some())
            .field("is_factory_function", &self.is_factory_function)
            .field("strict", &self.strict)
            .finish()
    }
}

/// Run one transform phase over the function node.
///
/// A transform failure surfaces as `InvalidConfiguration` carrying the
/// phase and transform names.
pub(crate) fn run_phase(
    phase: &str,
    transforms: &[Box<dyn AstTransform>],
    func: &mut FunctionNode,
    file: &mut Program,
) -> SkyhookResult<()> {
    for transform in transforms {
        transform.apply(func, file).map_err(|err| {
            SkyhookError::invalid_config(format!(
                "{phase} transform `{}` failed: {err}",
                transform.name()
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhook_parser::parse_function_source;

    struct RenameParams;

    impl AstTransform for RenameParams {
        fn name(&self) -> &str {
            "rename-params"
        }

        fn apply(&self, func: &mut FunctionNode, _file: &mut Program) -> SkyhookResult<()> {
            if let FunctionNode::Arrow(arrow) = func {
                for param in &mut arrow.params {
                    if let skyhook_parser::ast::Pattern::Ident(name) = param {
                        *name = format!("{name}_renamed");
                    }
                }
            }
            Ok(())
        }
    }

    struct Failing;

    impl AstTransform for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _func: &mut FunctionNode, _file: &mut Program) -> SkyhookResult<()> {
            Err(SkyhookError::internal("nope"))
        }
    }

    #[test]
    fn test_phase_applies_in_order() {
        let parsed = parse_function_source("(a) => a").unwrap();
        let mut node = parsed.node.clone();
        let mut file = parsed.file.clone();
        let transforms: Vec<Box<dyn AstTransform>> = vec![Box::new(RenameParams)];
        run_phase("pre-process", &transforms, &mut node, &mut file).unwrap();

        let FunctionNode::Arrow(arrow) = &node else {
            panic!("expected arrow");
        };
        assert!(matches!(
            &arrow.params[0],
            skyhook_parser::ast::Pattern::Ident(name) if name == "a_renamed"
        ));
    }

    #[test]
    fn test_failure_becomes_invalid_configuration() {
        let parsed = parse_function_source("() => 1").unwrap();
        let mut node = parsed.node.clone();
        let mut file = parsed.file.clone();
        let transforms: Vec<Box<dyn AstTransform>> = vec![Box::new(Failing)];
        let err = run_phase("post-process", &transforms, &mut node, &mut file).unwrap_err();
        assert!(matches!(err, SkyhookError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("failing"));
    }

    #[test]
    fn test_options_default() {
        let options = SerializeOptions::default();
        assert!(!options.is_factory_function);
        assert!(!options.strict);
        assert!(options.pre_serialize_value.is_none());
    }
}
