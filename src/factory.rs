use anyhow::bail;
use serde::{Deserialize, Serialize};

use groupn_party_component::{create_static_party, NegotiationParty, PartyContext, PartyFactory};

use crate::actor::PartyAddr;
use crate::agent::NegotiationAgent;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum LoadMode {
    BuiltIn,
    /// Party registered in process with `register_party` under `library::name`.
    StaticLib { library: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartyConfig {
    pub name: String,
    pub load_mode: LoadMode,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

pub fn create_party(
    config: PartyConfig,
    ctx: PartyContext,
) -> anyhow::Result<Box<dyn NegotiationParty>> {
    log::debug!(
        "Creating party '{}' ({}) with load mode {:?}.",
        ctx.id,
        config.name,
        config.load_mode
    );

    match config.load_mode {
        LoadMode::BuiltIn => create_builtin(&config.name, ctx, config.params),
        LoadMode::StaticLib { library } => {
            create_static_party(&format!("{}::{}", library, config.name), ctx, config.params)
        }
    }
}

/// Creates party and starts its actor.
pub fn spawn_party(config: PartyConfig, ctx: PartyContext) -> anyhow::Result<PartyAddr> {
    Ok(PartyAddr::from(create_party(config, ctx)?))
}

pub fn create_builtin(
    name: &str,
    ctx: PartyContext,
    config: serde_yaml::Value,
) -> anyhow::Result<Box<dyn NegotiationParty>> {
    let party = match name {
        "Groupn" => {
            Box::new(<NegotiationAgent as PartyFactory<_>>::new(ctx, config)?)
                as Box<dyn NegotiationParty>
        }
        _ => bail!("BuiltIn party {} doesn't exists.", &name),
    };
    Ok(party)
}
