//! The host-visible module: overloaded free functions and exposed classes.

use std::sync::Arc;

use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, Dim, OMatrix};
use tracing::debug;

use matrus_core::Element;

use crate::error::{Error, Rejection, Result};
use crate::exposure::{ClassDescriptor, Instance};
use crate::host::HostValue;
use crate::inbound::ConversionSlot;
use crate::native::{describe, NativeMatrix};
use crate::registry::ConversionRegistry;

/// Native return values the module can hand to the host.
pub trait IntoHostValue {
    fn into_host_value(self, registry: &ConversionRegistry) -> Result<HostValue<'static>>;
}

impl IntoHostValue for () {
    fn into_host_value(self, _registry: &ConversionRegistry) -> Result<HostValue<'static>> {
        Ok(HostValue::None)
    }
}

impl<T, R, C> IntoHostValue for OMatrix<T, R, C>
where
    T: Element,
    R: Dim,
    C: Dim,
    DefaultAllocator: Allocator<T, R, C>,
{
    fn into_host_value(self, registry: &ConversionRegistry) -> Result<HostValue<'static>> {
        registry.to_host(&self).map(HostValue::from)
    }
}

/// Why one overload did not produce a value.
enum CallError {
    /// Argument `position` failed the convertibility check; try the next
    /// overload.
    Rejected { position: usize, rejection: Rejection },
    /// Failure after the checkpoint; propagated as is.
    Failed(Error),
}

type OverloadFn = Box<
    dyn Fn(&ConversionRegistry, &[HostValue<'_>]) -> std::result::Result<HostValue<'static>, CallError>
        + Send
        + Sync,
>;

/// One typed signature of a module function.
pub struct Overload {
    signature: String,
    arity: usize,
    call: OverloadFn,
}

impl Overload {
    pub fn nullary<R, F>(f: F) -> Self
    where
        R: IntoHostValue,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            signature: "()".to_string(),
            arity: 0,
            call: Box::new(
                move |registry: &ConversionRegistry,
                      _args: &[HostValue<'_>]|
                      -> std::result::Result<HostValue<'static>, CallError> {
                    f().into_host_value(registry).map_err(CallError::Failed)
                },
            ),
        }
    }

    /// A function of one matrix argument, converted in place.
    pub fn unary<A, R, F>(f: F) -> Self
    where
        A: NativeMatrix,
        R: IntoHostValue,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self {
            signature: format!("({})", describe::<A>()),
            arity: 1,
            call: Box::new(
                move |registry: &ConversionRegistry,
                      args: &[HostValue<'_>]|
                      -> std::result::Result<HostValue<'static>, CallError> {
                    let mut slot = ConversionSlot::<A>::new();
                    let a = registry
                        .construct(&args[0], &mut slot)
                        .map_err(|rejection| CallError::Rejected {
                            position: 0,
                            rejection,
                        })?;
                    f(&*a).into_host_value(registry).map_err(CallError::Failed)
                },
            ),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// A named function with its overloads in resolution order.
pub struct Function {
    name: &'static str,
    doc: &'static str,
    overloads: Vec<Overload>,
}

impl Function {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn signatures(&self) -> Vec<&str> {
        self.overloads.iter().map(|o| o.signature()).collect()
    }
}

pub struct ModuleBuilder<'r> {
    name: String,
    registry: &'r ConversionRegistry,
    functions: Vec<Function>,
    classes: Vec<Arc<ClassDescriptor>>,
}

impl<'r> ModuleBuilder<'r> {
    /// Add an overload of `name`. Repeated names append overloads; the doc
    /// of the first definition is kept.
    pub fn def(mut self, name: &'static str, doc: &'static str, overload: Overload) -> Self {
        match self.functions.iter_mut().find(|f| f.name == name) {
            Some(function) => function.overloads.push(overload),
            None => self.functions.push(Function {
                name,
                doc,
                overloads: vec![overload],
            }),
        }
        self
    }

    pub fn class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(Arc::new(class));
        self
    }

    pub fn build(self) -> Module<'r> {
        debug!(
            module = %self.name,
            functions = self.functions.len(),
            classes = self.classes.len(),
            "module built"
        );
        Module {
            name: self.name,
            registry: self.registry,
            functions: self.functions,
            classes: self.classes,
        }
    }
}

/// Functions and classes bound to one conversion registry.
pub struct Module<'r> {
    name: String,
    registry: &'r ConversionRegistry,
    functions: Vec<Function>,
    classes: Vec<Arc<ClassDescriptor>>,
}

impl<'r> Module<'r> {
    pub fn builder(name: impl Into<String>, registry: &'r ConversionRegistry) -> ModuleBuilder<'r> {
        ModuleBuilder {
            name: name.into(),
            registry,
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &'r ConversionRegistry {
        self.registry
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Result<&Function> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }

    pub fn classes(&self) -> &[Arc<ClassDescriptor>] {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Result<&Arc<ClassDescriptor>> {
        self.classes
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::UnknownClass(name.to_string()))
    }

    /// Call `name` with the first overload whose arguments convert.
    ///
    /// Overloads rejected by the convertibility check are skipped; when
    /// none is left the error lists why each was refused. Failures after
    /// an overload accepted its arguments are returned unchanged.
    pub fn call(&self, name: &str, args: &[HostValue<'_>]) -> Result<HostValue<'static>> {
        let function = self.function(name)?;
        let mut details = Vec::with_capacity(function.overloads.len());

        for overload in &function.overloads {
            if overload.arity != args.len() {
                details.push(format!(
                    "  {}{}: takes {} arguments ({} given)",
                    name,
                    overload.signature,
                    overload.arity,
                    args.len()
                ));
                continue;
            }
            match (overload.call)(self.registry, args) {
                Ok(value) => return Ok(value),
                Err(CallError::Rejected { position, rejection }) => {
                    debug!(function = name, signature = %overload.signature, %rejection, "overload rejected");
                    details.push(format!(
                        "  {}{}: argument {}: {}",
                        name, overload.signature, position, rejection
                    ));
                }
                Err(CallError::Failed(err)) => return Err(err),
            }
        }

        Err(Error::NoMatchingOverload {
            function: name.to_string(),
            details: details.join("\n"),
        })
    }

    /// Construct an instance of the exposed class `class`.
    pub fn instantiate(&self, class: &str, args: &[HostValue<'_>]) -> Result<HostValue<'static>> {
        let instance = self.class(class)?.instantiate(self.registry, args)?;
        Ok(HostValue::Object(instance))
    }

    /// Call a method on an instance with this module's registry.
    pub fn call_method(
        &self,
        instance: &Arc<Instance>,
        method: &str,
        args: &[HostValue<'_>],
    ) -> Result<HostValue<'static>> {
        instance.call(self.registry, method, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReregisterPolicy;
    use crate::host::HostArray;
    use crate::registry;
    use nalgebra::DMatrix;

    fn registry() -> ConversionRegistry {
        registry::defaults(ReregisterPolicy::Ignore).unwrap().build()
    }

    #[test]
    fn test_overload_resolution_order() {
        let registry = registry();
        let module = Module::builder("m", &registry)
            .def("width", "", Overload::unary(|m: &DMatrix<f64>| DMatrix::from_element(1, 1, m.ncols() as f64)))
            .def("width", "", Overload::unary(|m: &DMatrix<i32>| DMatrix::from_element(1, 1, m.ncols() as i32)))
            .build();

        let ints: HostValue = HostArray::from_row_major(&[1, 3], &[1i32, 2, 3]).unwrap().into();
        let out = module.call("width", &[ints]).unwrap().into_array().unwrap();
        assert_eq!(out.to_vec::<i32>(), Some(vec![3]));

        let floats: HostValue = HostArray::from_row_major(&[1, 2], &[1.0f64, 2.0]).unwrap().into();
        let out = module.call("width", &[floats]).unwrap().into_array().unwrap();
        assert_eq!(out.to_vec::<f64>(), Some(vec![2.0]));
    }

    #[test]
    fn test_no_matching_overload() {
        let registry = registry();
        let module = Module::builder("m", &registry)
            .def("id", "", Overload::unary(|m: &DMatrix<f64>| m.clone()))
            .build();

        let floats: HostValue = HostArray::from_row_major(&[1, 1], &[1.0f32]).unwrap().into();
        let err = module.call("id", &[floats]).unwrap_err();
        match err {
            Error::NoMatchingOverload { function, details } => {
                assert_eq!(function, "id");
                assert!(details.contains("float32"), "{}", details);
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(matches!(
            module.call("id", &[]),
            Err(Error::NoMatchingOverload { .. })
        ));
        assert!(matches!(module.call("nope", &[]), Err(Error::UnknownFunction(_))));
    }

    #[test]
    fn test_unregistered_return_type_fails() {
        let registry = registry::RegistryBuilder::default().build();
        let module = Module::builder("m", &registry)
            .def("zeros", "", Overload::nullary(|| DMatrix::<f64>::zeros(1, 1)))
            .build();
        assert!(matches!(
            module.call("zeros", &[]),
            Err(Error::Unregistered { .. })
        ));
    }

    #[test]
    fn test_signatures() {
        let registry = registry();
        let module = Module::builder("m", &registry)
            .def("f", "doc", Overload::nullary(|| ()))
            .def("f", "ignored", Overload::unary(|_: &DMatrix<i32>| ()))
            .build();
        let f = module.function("f").unwrap();
        assert_eq!(f.doc(), "doc");
        assert_eq!(f.signatures(), vec!["()", "(Matrix<int32, Dyn, Dyn>)"]);
        assert!(module.call("f", &[]).unwrap().is_none());
    }
}
