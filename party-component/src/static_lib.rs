use anyhow::anyhow;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::component::{NegotiationParty, PartyContext};

pub type ConstructorFunction = Box<
    dyn Fn(PartyContext, serde_yaml::Value) -> anyhow::Result<Box<dyn NegotiationParty>>
        + Send
        + Sync,
>;

lazy_static! {
    /// Contains functions that can create parties by name.
    static ref CONSTRUCTORS: Arc<Mutex<HashMap<String, ConstructorFunction>>> = Arc::new(Mutex::new(HashMap::new()));
}

/// Implement to be able to register party with `factory` function.
pub trait PartyFactory<T> {
    fn new(ctx: PartyContext, config: serde_yaml::Value) -> anyhow::Result<T>;
}

pub fn factory<T>() -> ConstructorFunction
where
    T: PartyFactory<T> + NegotiationParty + 'static,
{
    Box::new(|ctx, config| Ok(Box::new(T::new(ctx, config)?) as Box<dyn NegotiationParty>))
}

pub fn register_party(library: &str, name: &str, constructor: ConstructorFunction) {
    log::debug!("Registering party constructor '{library}::{name}'.");

    CONSTRUCTORS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(format!("{library}::{name}"), constructor);
}

pub fn create_static_party(
    name_path: &str,
    ctx: PartyContext,
    config: serde_yaml::Value,
) -> anyhow::Result<Box<dyn NegotiationParty>> {
    let map = CONSTRUCTORS
        .lock()
        .map_err(|e| anyhow!("Failed to acquire static party creation lock: {e}"))?;

    match map.get(name_path) {
        Some(constructor) => constructor(ctx, config),
        None => Err(anyhow!("Party '{name_path}' not found.")),
    }
}
