//! Process-wide table of converters keyed by native type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use nalgebra::{DMatrix, DVector, RowDVector};
use tracing::{debug, info};

use crate::config::{BridgeConfig, ReregisterPolicy};
use crate::error::{Error, Rejection, Result};
use crate::host::{HostArray, HostValue};
use crate::inbound::{self, ConversionSlot};
use crate::native::{describe, NativeMatrix};
use crate::outbound;

/// Direction of a boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Native → host
    ToHost,
    /// Host → native
    FromHost,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::ToHost => "to-host",
            Direction::FromHost => "from-host",
        })
    }
}

type ToHostFn = fn(&dyn Any) -> Result<HostArray>;
type CheckFn = fn(&HostValue<'_>) -> std::result::Result<(), Rejection>;
type ConstructFn = fn(&HostValue<'_>, &mut dyn Any);

#[derive(Debug, Clone, Copy)]
struct InboundPair {
    check: CheckFn,
    construct: ConstructFn,
}

#[derive(Debug)]
struct Entry {
    type_name: String,
    to_host: Option<ToHostFn>,
    from_host: Option<InboundPair>,
}

fn erased_to_host<M: NativeMatrix>(value: &dyn Any) -> Result<HostArray> {
    match value.downcast_ref::<M>() {
        Some(m) => outbound::to_host_array(m),
        None => unreachable!("converter table is keyed by TypeId"),
    }
}

fn erased_check<M: NativeMatrix>(value: &HostValue<'_>) -> std::result::Result<(), Rejection> {
    inbound::check::<M>(value).map(|_| ())
}

fn erased_construct<M: NativeMatrix>(value: &HostValue<'_>, slot: &mut dyn Any) {
    let Some(slot) = slot.downcast_mut::<ConversionSlot<M>>() else {
        unreachable!("converter table is keyed by TypeId")
    };
    match inbound::check::<M>(value) {
        Ok(token) => {
            inbound::construct_into(token, slot);
        }
        Err(rejection) => panic!("construct called on a rejected value: {}", rejection),
    }
}

/// Collects converter registrations before the registry is frozen.
#[derive(Debug)]
pub struct RegistryBuilder {
    entries: HashMap<TypeId, Entry>,
    policy: ReregisterPolicy,
}

impl RegistryBuilder {
    pub fn new(policy: ReregisterPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    fn entry<M: NativeMatrix>(&mut self) -> &mut Entry {
        self.entries.entry(TypeId::of::<M>()).or_insert_with(|| Entry {
            type_name: describe::<M>(),
            to_host: None,
            from_host: None,
        })
    }

    fn duplicate<M: NativeMatrix>(&self, direction: Direction) -> Result<()> {
        match self.policy {
            ReregisterPolicy::Ignore => {
                debug!(type_name = %describe::<M>(), %direction, "converter already registered, ignoring");
                Ok(())
            }
            ReregisterPolicy::Reject => Err(Error::DuplicateRegistration {
                type_name: describe::<M>(),
                direction,
            }),
        }
    }

    /// Register the native → host converter for `M`.
    pub fn register_to_host<M: NativeMatrix>(&mut self) -> Result<&mut Self> {
        if self.entry::<M>().to_host.is_some() {
            self.duplicate::<M>(Direction::ToHost)?;
            return Ok(self);
        }
        self.entry::<M>().to_host = Some(erased_to_host::<M>);
        debug!(type_name = %describe::<M>(), "registered to-host converter");
        Ok(self)
    }

    /// Register the host → native converter for `M`.
    pub fn register_from_host<M: NativeMatrix>(&mut self) -> Result<&mut Self> {
        if self.entry::<M>().from_host.is_some() {
            self.duplicate::<M>(Direction::FromHost)?;
            return Ok(self);
        }
        self.entry::<M>().from_host = Some(InboundPair {
            check: erased_check::<M>,
            construct: erased_construct::<M>,
        });
        debug!(type_name = %describe::<M>(), "registered from-host converter");
        Ok(self)
    }

    /// Both directions for `M`.
    pub fn register<M: NativeMatrix>(&mut self) -> Result<&mut Self> {
        self.register_to_host::<M>()?.register_from_host::<M>()
    }

    pub fn build(self) -> ConversionRegistry {
        ConversionRegistry {
            entries: self.entries,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new(ReregisterPolicy::default())
    }
}

/// Immutable converter table.
pub struct ConversionRegistry {
    entries: HashMap<TypeId, Entry>,
}

impl ConversionRegistry {
    pub fn builder(policy: ReregisterPolicy) -> RegistryBuilder {
        RegistryBuilder::new(policy)
    }

    fn lookup<M: NativeMatrix>(&self) -> Option<&Entry> {
        self.entries.get(&TypeId::of::<M>())
    }

    pub fn has_to_host<M: NativeMatrix>(&self) -> bool {
        self.lookup::<M>().is_some_and(|e| e.to_host.is_some())
    }

    pub fn has_from_host<M: NativeMatrix>(&self) -> bool {
        self.lookup::<M>().is_some_and(|e| e.from_host.is_some())
    }

    /// Convert a native value with its registered converter.
    pub fn to_host<M: NativeMatrix>(&self, value: &M) -> Result<HostArray> {
        let convert = self
            .lookup::<M>()
            .and_then(|e| e.to_host)
            .ok_or_else(|| Error::Unregistered {
                type_name: describe::<M>(),
                direction: Direction::ToHost,
            })?;
        convert(value)
    }

    fn inbound<M: NativeMatrix>(&self) -> std::result::Result<InboundPair, Rejection> {
        self.lookup::<M>()
            .and_then(|e| e.from_host)
            .ok_or_else(|| Rejection::NoConverter {
                target: describe::<M>(),
            })
    }

    /// Convertibility check through the registered converter. An
    /// unregistered target rejects every value.
    pub fn check<M: NativeMatrix>(&self, value: &HostValue<'_>) -> std::result::Result<(), Rejection> {
        (self.inbound::<M>()?.check)(value)
    }

    /// Check `value` and, if convertible, construct the `M` in `slot`.
    pub fn construct<'s, M: NativeMatrix>(
        &self,
        value: &HostValue<'_>,
        slot: &'s mut ConversionSlot<M>,
    ) -> std::result::Result<&'s mut M, Rejection> {
        let pair = self.inbound::<M>()?;
        (pair.check)(value)?;
        (pair.construct)(value, &mut *slot);
        Ok(slot
            .get_mut()
            .expect("registered constructor leaves the slot constructed"))
    }

    /// Number of native types with at least one converter.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered native types, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.type_name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Builder preloaded with the default conversions: dynamic matrices both
/// ways, dynamic column and row vectors outbound, for f64, f32 and i32.
pub fn defaults(policy: ReregisterPolicy) -> Result<RegistryBuilder> {
    let mut builder = RegistryBuilder::new(policy);
    builder
        .register::<DMatrix<f64>>()?
        .register::<DMatrix<f32>>()?
        .register::<DMatrix<i32>>()?
        .register_to_host::<DVector<f64>>()?
        .register_to_host::<DVector<f32>>()?
        .register_to_host::<DVector<i32>>()?
        .register_to_host::<RowDVector<f64>>()?
        .register_to_host::<RowDVector<f32>>()?
        .register_to_host::<RowDVector<i32>>()?;
    Ok(builder)
}

static REGISTRY: OnceLock<ConversionRegistry> = OnceLock::new();

/// Install the default registry once. Later calls return the same instance.
pub fn initialize(config: &BridgeConfig) -> Result<&'static ConversionRegistry> {
    if let Some(registry) = REGISTRY.get() {
        return Ok(registry);
    }
    let registry = defaults(config.reregister)?.build();
    let registry = REGISTRY.get_or_init(|| registry);
    info!(types = registry.len(), "conversion registry initialized");
    Ok(registry)
}

/// The process-wide registry, once [`initialize`] has run.
pub fn global() -> Result<&'static ConversionRegistry> {
    REGISTRY.get().ok_or(Error::NotInitialized)
}
