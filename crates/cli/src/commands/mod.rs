// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod list;
pub mod tasks;
pub mod upload;
pub mod watch;
pub mod write;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::debug;

use kp_core::{Collection, Entity, LedgerEntry, Payload};

use crate::cli::{Cli, Command, GlobalArgs};
use crate::config::{config_path, Config, RemoteConfig};
use crate::env;
use crate::error::{Error, Result};
use crate::objstore::DirObjectStore;
use crate::sync::{Origin, RemoteCollections, StoreRegistry, SyncStore, WsRemote};

/// Run `$body` with `$P` bound to the payload type of `$collection`.
macro_rules! with_payload {
    ($collection:expr, $P:ident => $body:expr) => {
        match $collection {
            kp_core::Collection::Credentials => {
                type $P = kp_core::Credential;
                $body
            }
            kp_core::Collection::Notes => {
                type $P = kp_core::Note;
                $body
            }
            kp_core::Collection::Tasks => {
                type $P = kp_core::Task;
                $body
            }
            kp_core::Collection::Vault => {
                type $P = kp_core::VaultItem;
                $body
            }
            kp_core::Collection::Expenses => {
                type $P = kp_core::Expense;
                $body
            }
            kp_core::Collection::Ledger => {
                type $P = kp_core::LedgerEntry;
                $body
            }
        }
    };
}

/// Resolved settings for one invocation.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub owner: Option<String>,
    pub remote: RemoteConfig,
}

impl Context {
    /// Load config and apply command line and environment overrides.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let config_path = match &global.config {
            Some(path) => path.clone(),
            None => config_path()?,
        };
        let config = Config::load(&config_path)?;
        let owner = config.resolve_owner(global.owner.as_deref());

        let mut remote = config.remote.clone();
        if let Some(url) = global.url.clone().or_else(env::remote_url) {
            remote.url = url;
        }
        if let Some(msg) = remote.validate_url() {
            return Err(Error::Config(msg));
        }

        Ok(Context {
            config,
            config_path,
            owner,
            remote,
        })
    }

    pub fn require_owner(&self) -> Result<String> {
        self.owner.clone().ok_or(Error::Unauthenticated)
    }

    /// How long to wait for the first snapshot of a collection.
    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }

    /// Connect to the remote service and sign in as the owner.
    pub async fn connect(&self) -> Result<StoreRegistry<WsRemote>> {
        let owner = self.require_owner()?;
        let remote = WsRemote::connect(&self.remote.sync_config()).await?;
        let registry = StoreRegistry::new(Arc::new(remote));
        registry.sign_in(&owner)?;
        Ok(registry)
    }
}

/// Open `P`'s store and wait until the remote service has delivered once.
///
/// Fails as soon as the subscription ends without a snapshot.
pub async fn open_synced<P: Payload, R: RemoteCollections>(
    registry: &StoreRegistry<R>,
    timeout: Duration,
) -> Result<Arc<SyncStore<P, R>>> {
    let timed_out = || Error::Sync(format!("timed out waiting for {}", P::COLLECTION));
    let closed = || Error::Sync(format!("{} subscription closed", P::COLLECTION));

    let (store, stream) = registry.open_with_stream::<P>()?;
    match stream {
        Some(mut stream) => {
            tokio::time::timeout(timeout, stream.next())
                .await
                .map_err(|_| timed_out())?
                .ok_or_else(closed)?;
        }
        None => {
            let mut changes = store.changes();
            tokio::time::timeout(timeout, changes.wait_for(|s| s.origin() != Origin::Empty))
                .await
                .map_err(|_| timed_out())?
                .map_err(|_| closed())
                .map(drop)?;
        }
    }
    debug!("{} synced: {} entries", P::COLLECTION, store.current().len());
    Ok(store)
}

/// JSON shape of one entry in command output.
#[derive(Serialize)]
pub(crate) struct EntryJson<'a, P> {
    key: &'a str,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<i64>,
    #[serde(flatten)]
    payload: &'a P,
}

impl<'a, P> From<&'a Entity<P>> for EntryJson<'a, P> {
    fn from(entity: &'a Entity<P>) -> Self {
        EntryJson {
            key: &entity.key,
            created_at: entity.created_at,
            order: entity.order,
            payload: &entity.payload,
        }
    }
}

/// One text line per entry.
pub(crate) fn write_entries<P: Payload, W: Write>(
    entities: &[Entity<P>],
    out: &mut W,
) -> Result<()> {
    if entities.is_empty() {
        writeln!(out, "No {}.", P::COLLECTION)?;
    }
    for entity in entities {
        writeln!(out, "{}  {}", entity.key, entity.payload.summary())?;
    }
    Ok(())
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(&cli.global)?;
    let mut out = std::io::stdout();

    match cli.command {
        Command::Config(cmd) => config::run(&ctx, cmd, &mut out),

        Command::List { collection, output } => {
            let registry = ctx.connect().await?;
            let timeout = ctx.snapshot_timeout();
            if collection == Collection::Ledger {
                let snapshot =
                    list::run::<LedgerEntry, _, _>(&registry, timeout, output.json, &mut out)
                        .await?;
                if !output.json {
                    list::write_balance(&snapshot, &mut out)?;
                }
                return Ok(());
            }
            with_payload!(collection, P => {
                list::run::<P, _, _>(&registry, timeout, output.json, &mut out).await.map(drop)
            })
        }

        Command::Watch {
            collection,
            count,
            output,
        } => {
            let registry = ctx.connect().await?;
            with_payload!(collection, P => {
                watch::run::<P, _, _>(&registry, count, output.json, &mut out).await
            })
        }

        Command::Add { collection, fields } => {
            with_payload!(collection, P => {
                let payload = write::parse_payload::<P>(&fields)?;
                let registry = ctx.connect().await?;
                write::add(&registry, payload, &mut out).await
            })
        }

        Command::Edit {
            collection,
            key,
            fields,
        } => {
            let patch = write::parse_patch(collection, &fields)?;
            let registry = ctx.connect().await?;
            let timeout = ctx.snapshot_timeout();
            with_payload!(collection, P => {
                write::edit::<P, _, _>(&registry, &key, patch, timeout, &mut out).await
            })
        }

        Command::Rm { collection, key } => {
            let registry = ctx.connect().await?;
            with_payload!(collection, P => {
                write::remove::<P, _, _>(&registry, &key, &mut out).await
            })
        }

        Command::Move { from, to } => {
            let registry = ctx.connect().await?;
            tasks::reorder(&registry, from, to, ctx.snapshot_timeout(), &mut out).await
        }

        Command::Toggle { key } => {
            let registry = ctx.connect().await?;
            tasks::toggle(&registry, &key, ctx.snapshot_timeout(), &mut out).await
        }

        Command::Upload { path, name } => {
            ctx.require_owner()?;
            let file = upload::read_file(&path, name).await?;
            let objects = DirObjectStore::new(ctx.config.objects_dir()?);
            let registry = ctx.connect().await?;
            upload::run(&registry, &objects, file, &mut out).await
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
