//! Exposure of the preconditioner family to the host runtime.
//!
//! A host-visible class is described by data rather than by a type: a
//! [`ClassDescriptor`] is the flattened union of one or more
//! [`CapabilitySet`]s (a constructor plus named methods). Every variant
//! gets [`base_capabilities`]; the diagonal variants add
//! [`dimension_capabilities`]. Sets only ever add methods, so composing two
//! sets that define the same name is an initialization error.
//!
//! Instances hold their algorithm in a [`PreconditionerState`] behind a
//! mutex, since the host may share one instance between threads.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;
use tracing::debug;

use matrus_solvers::{
    DiagonalPreconditioner, IdentityPreconditioner, LeastSquareDiagonalPreconditioner,
    Preconditioner,
};

use crate::error::{Error, Result};
use crate::host::HostValue;
use crate::inbound::ConversionSlot;
use crate::registry::ConversionRegistry;

/// Matrix type every exposed method takes.
pub type DenseMatrix = DMatrix<f64>;

/// The algorithm behind an [`Instance`].
#[derive(Debug, Clone)]
pub enum PreconditionerState {
    Diagonal(DiagonalPreconditioner<f64>),
    LeastSquareDiagonal(LeastSquareDiagonalPreconditioner<f64>),
    Identity(IdentityPreconditioner),
}

/// Links an algorithm type to its host class and its state variant.
pub trait ExposedPreconditioner: Preconditioner<f64> + Send + 'static {
    const CLASS_NAME: &'static str;
    const DOC: &'static str;

    fn wrap(self) -> PreconditionerState;

    fn project(state: &mut PreconditionerState) -> Option<&mut Self>;
}

impl ExposedPreconditioner for DiagonalPreconditioner<f64> {
    const CLASS_NAME: &'static str = "DiagonalPreconditioner";
    const DOC: &'static str = "A preconditioner based on the diagonal entries.\n\
        This class allows to approximately solve for A.x = b problems assuming A is a diagonal matrix.";

    fn wrap(self) -> PreconditionerState {
        PreconditionerState::Diagonal(self)
    }

    fn project(state: &mut PreconditionerState) -> Option<&mut Self> {
        match state {
            PreconditionerState::Diagonal(p) => Some(p),
            _ => None,
        }
    }
}

impl ExposedPreconditioner for LeastSquareDiagonalPreconditioner<f64> {
    const CLASS_NAME: &'static str = "LeastSquareDiagonalPreconditioner";
    const DOC: &'static str = "Jacobi preconditioner for LeastSquaresConjugateGradient.\n\
        This class allows to approximately solve for A' A x = A' b problems assuming A' A is a diagonal matrix.";

    fn wrap(self) -> PreconditionerState {
        PreconditionerState::LeastSquareDiagonal(self)
    }

    fn project(state: &mut PreconditionerState) -> Option<&mut Self> {
        match state {
            PreconditionerState::LeastSquareDiagonal(p) => Some(p),
            _ => None,
        }
    }
}

impl ExposedPreconditioner for IdentityPreconditioner {
    const CLASS_NAME: &'static str = "IdentityPreconditioner";
    const DOC: &'static str =
        "A naive preconditioner which approximates any matrix as the identity matrix.";

    fn wrap(self) -> PreconditionerState {
        PreconditionerState::Identity(self)
    }

    fn project(state: &mut PreconditionerState) -> Option<&mut Self> {
        match state {
            PreconditionerState::Identity(p) => Some(p),
            _ => None,
        }
    }
}

/// Algorithms with a size, exposed as `rows()` / `cols()`.
pub trait Dimensions {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
}

impl Dimensions for DiagonalPreconditioner<f64> {
    fn rows(&self) -> usize {
        DiagonalPreconditioner::rows(self)
    }

    fn cols(&self) -> usize {
        DiagonalPreconditioner::cols(self)
    }
}

impl Dimensions for LeastSquareDiagonalPreconditioner<f64> {
    fn rows(&self) -> usize {
        DiagonalPreconditioner::rows(&**self)
    }

    fn cols(&self) -> usize {
        DiagonalPreconditioner::cols(&**self)
    }
}

/// What a method hands back to the host.
pub enum MethodReturn {
    Value(HostValue<'static>),
    /// The receiving instance itself, for chaining.
    SelfRef,
}

pub type InitFn = fn(&ConversionRegistry, &[HostValue<'_>]) -> Result<PreconditionerState>;

pub type MethodFn =
    fn(&mut PreconditionerState, &ConversionRegistry, &[HostValue<'_>]) -> Result<MethodReturn>;

#[derive(Clone)]
pub struct InitDescriptor {
    pub doc: &'static str,
    pub call: InitFn,
}

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub doc: &'static str,
    /// Positional parameter names; the method's arity
    pub params: &'static [&'static str],
    pub call: MethodFn,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A named group of methods, optionally with a constructor.
#[derive(Clone)]
pub struct CapabilitySet {
    pub name: &'static str,
    pub init: Option<InitDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

fn callable<P: ExposedPreconditioner>(method: &str) -> String {
    format!("{}.{}", P::CLASS_NAME, method)
}

fn state_of<P: ExposedPreconditioner>(state: &mut PreconditionerState) -> Result<&mut P> {
    P::project(state).ok_or(Error::StateMismatch {
        class: P::CLASS_NAME,
    })
}

fn matrix_arg<'s, P: ExposedPreconditioner>(
    registry: &ConversionRegistry,
    value: &HostValue<'_>,
    slot: &'s mut ConversionSlot<DenseMatrix>,
    method: &str,
    param: &'static str,
) -> Result<&'s mut DenseMatrix> {
    registry
        .construct(value, slot)
        .map_err(|rejection| Error::ArgumentType {
            callable: callable::<P>(method),
            param,
            rejection,
        })
}

fn init<P: ExposedPreconditioner>(
    registry: &ConversionRegistry,
    args: &[HostValue<'_>],
) -> Result<PreconditionerState> {
    match args {
        [] => Ok(P::default().wrap()),
        [a] => {
            let mut slot = ConversionSlot::new();
            let a = matrix_arg::<P>(registry, a, &mut slot, "__init__", "A")?;
            Ok(P::from_matrix(a).wrap())
        }
        _ => Err(Error::ArgumentCount {
            callable: P::CLASS_NAME.to_string(),
            expected: "0 or 1".to_string(),
            got: args.len(),
        }),
    }
}

fn info<P: ExposedPreconditioner>(
    state: &mut PreconditionerState,
    _registry: &ConversionRegistry,
    _args: &[HostValue<'_>],
) -> Result<MethodReturn> {
    let p = state_of::<P>(state)?;
    Ok(MethodReturn::Value(HostValue::Int(p.info().code() as i64)))
}

fn solve<P: ExposedPreconditioner>(
    state: &mut PreconditionerState,
    registry: &ConversionRegistry,
    args: &[HostValue<'_>],
) -> Result<MethodReturn> {
    let p = state_of::<P>(state)?;
    let mut slot = ConversionSlot::new();
    let b = matrix_arg::<P>(registry, &args[0], &mut slot, "solve", "b")?;
    if b.ncols() != 1 {
        return Err(Error::ArgumentShape {
            callable: callable::<P>("solve"),
            param: "b",
            expected: "(n, 1)",
            rows: b.nrows(),
            cols: b.ncols(),
        });
    }
    let b: DVector<f64> = b.column(0).into_owned();
    let x = p.solve(&b)?;
    Ok(MethodReturn::Value(registry.to_host(&x)?.into()))
}

fn compute<P: ExposedPreconditioner>(
    state: &mut PreconditionerState,
    registry: &ConversionRegistry,
    args: &[HostValue<'_>],
) -> Result<MethodReturn> {
    let p = state_of::<P>(state)?;
    let mut slot = ConversionSlot::new();
    let a = matrix_arg::<P>(registry, &args[0], &mut slot, "compute", "mat")?;
    p.compute(a);
    Ok(MethodReturn::SelfRef)
}

fn rows<P: ExposedPreconditioner + Dimensions>(
    state: &mut PreconditionerState,
    _registry: &ConversionRegistry,
    _args: &[HostValue<'_>],
) -> Result<MethodReturn> {
    let p = state_of::<P>(state)?;
    Ok(MethodReturn::Value(HostValue::Int(p.rows() as i64)))
}

fn cols<P: ExposedPreconditioner + Dimensions>(
    state: &mut PreconditionerState,
    _registry: &ConversionRegistry,
    _args: &[HostValue<'_>],
) -> Result<MethodReturn> {
    let p = state_of::<P>(state)?;
    Ok(MethodReturn::Value(HostValue::Int(p.cols() as i64)))
}

/// Constructor, `info`, `solve` and `compute`; shared by every variant.
pub fn base_capabilities<P: ExposedPreconditioner>() -> CapabilitySet {
    CapabilitySet {
        name: "PreconditionerBase",
        init: Some(InitDescriptor {
            doc: "Construct uninitialized, or initialized from the matrix A.",
            call: init::<P>,
        }),
        methods: vec![
            MethodDescriptor {
                name: "info",
                doc: "Returns success if the preconditioner has been well initialized.",
                params: &[],
                call: info::<P>,
            },
            MethodDescriptor {
                name: "solve",
                doc: "Returns the approximate solution of A x = b for an (n, 1) column b.",
                params: &["b"],
                call: solve::<P>,
            },
            MethodDescriptor {
                name: "compute",
                doc: "Initializes the preconditioner from mat and returns it.",
                params: &["mat"],
                call: compute::<P>,
            },
        ],
    }
}

/// `rows()` and `cols()`.
pub fn dimension_capabilities<P: ExposedPreconditioner + Dimensions>() -> CapabilitySet {
    CapabilitySet {
        name: "Dimensions",
        init: None,
        methods: vec![
            MethodDescriptor {
                name: "rows",
                doc: "Number of rows of the preconditioner.",
                params: &[],
                call: rows::<P>,
            },
            MethodDescriptor {
                name: "cols",
                doc: "Number of columns of the preconditioner.",
                params: &[],
                call: cols::<P>,
            },
        ],
    }
}

/// The contract of the diagonal family, for any algorithm type that
/// fulfils it.
pub fn diagonal_contract<P: ExposedPreconditioner + Dimensions>() -> Vec<CapabilitySet> {
    vec![base_capabilities::<P>(), dimension_capabilities::<P>()]
}

/// A host-visible class: flattened constructor and method table.
pub struct ClassDescriptor {
    name: &'static str,
    doc: &'static str,
    init: InitDescriptor,
    methods: Vec<MethodDescriptor>,
    capabilities: Vec<&'static str>,
}

impl ClassDescriptor {
    /// Flatten `sets` into one class.
    pub fn compose(
        name: &'static str,
        doc: &'static str,
        sets: impl IntoIterator<Item = CapabilitySet>,
    ) -> Result<Self> {
        let mut init: Option<InitDescriptor> = None;
        let mut methods: Vec<MethodDescriptor> = Vec::new();
        let mut capabilities = Vec::new();

        for set in sets {
            capabilities.push(set.name);
            if let Some(ctor) = set.init {
                if init.is_some() {
                    return Err(Error::DuplicateMethod {
                        class: name,
                        method: "__init__",
                    });
                }
                init = Some(ctor);
            }
            for method in set.methods {
                if methods.iter().any(|m| m.name == method.name) {
                    return Err(Error::DuplicateMethod {
                        class: name,
                        method: method.name,
                    });
                }
                methods.push(method);
            }
        }

        let init = init.ok_or(Error::MissingConstructor { class: name })?;
        debug!(class = name, methods = methods.len(), "composed class");
        Ok(Self {
            name,
            doc,
            init,
            methods,
            capabilities,
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn doc(&self) -> &'static str {
        self.doc
    }

    pub fn init(&self) -> &InitDescriptor {
        &self.init
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.name).collect()
    }

    /// Names of the capability sets this class was composed from.
    pub fn capabilities(&self) -> &[&'static str] {
        &self.capabilities
    }

    /// Run the constructor and wrap the state in a new instance.
    pub fn instantiate(
        self: &Arc<Self>,
        registry: &ConversionRegistry,
        args: &[HostValue<'_>],
    ) -> Result<Arc<Instance>> {
        let state = (self.init.call)(registry, args)?;
        Ok(Arc::new(Instance {
            class: Arc::clone(self),
            state: Mutex::new(state),
        }))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// A live preconditioner object owned by the host.
pub struct Instance {
    class: Arc<ClassDescriptor>,
    state: Mutex<PreconditionerState>,
}

impl Instance {
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    pub fn class_name(&self) -> &'static str {
        self.class.name
    }

    /// Look `name` up in the class's method table and call it.
    pub fn call(
        self: &Arc<Self>,
        registry: &ConversionRegistry,
        name: &str,
        args: &[HostValue<'_>],
    ) -> Result<HostValue<'static>> {
        let method = self.class.method(name).ok_or_else(|| Error::UnknownMethod {
            class: self.class.name,
            method: name.to_string(),
        })?;
        if args.len() != method.params.len() {
            return Err(Error::ArgumentCount {
                callable: format!("{}.{}", self.class.name, method.name),
                expected: method.params.len().to_string(),
                got: args.len(),
            });
        }

        let ret = {
            let mut state = self.state.lock();
            (method.call)(&mut *state, registry, args)?
        };
        Ok(match ret {
            MethodReturn::Value(value) => value,
            MethodReturn::SelfRef => HostValue::Object(Arc::clone(self)),
        })
    }

    /// Read access to the algorithm state.
    pub fn with_state<R>(&self, f: impl FnOnce(&PreconditionerState) -> R) -> R {
        f(&*self.state.lock())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// The three preconditioner classes in registration order.
pub fn preconditioner_classes() -> Result<Vec<ClassDescriptor>> {
    type Diagonal = DiagonalPreconditioner<f64>;
    type LeastSquare = LeastSquareDiagonalPreconditioner<f64>;
    type Identity = IdentityPreconditioner;

    Ok(vec![
        ClassDescriptor::compose(Diagonal::CLASS_NAME, Diagonal::DOC, diagonal_contract::<Diagonal>())?,
        ClassDescriptor::compose(
            LeastSquare::CLASS_NAME,
            LeastSquare::DOC,
            diagonal_contract::<LeastSquare>(),
        )?,
        ClassDescriptor::compose(Identity::CLASS_NAME, Identity::DOC, [base_capabilities::<Identity>()])?,
    ])
}
