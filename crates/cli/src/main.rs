use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffboard_core::audit::ENTITY_STAFF_PRESENCE;
use staffboard_core::error::{CoreError, CoreResult};
use staffboard_core::planner::{DayPlanner, PlanDayRequest};
use staffboard_core::presence::PresenceService;
use staffboard_core::registry::RegistryCache;
use staffboard_core::roles::{can_manage_registry, is_requester_role, Actor};
use staffboard_db::repositories::{AuditLogRepo, PresenceStatusRepo, StaffRepo};
use staffboard_db::{DbPool, PgPresenceStore};
use staffboard_events::{AuditBus, AuditPersistence};

mod cli;
mod config;
mod error;

use cli::{Cli, Command};
use config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "staffboard=info,staffboard_core=info,staffboard_db=info,staffboard_events=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    // --- Configuration ---
    let config = CliConfig::from_env()?;
    tracing::info!(timezone = %config.presence.timezone, "Loaded configuration");

    // --- Database ---
    let pool = staffboard_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    staffboard_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    staffboard_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::debug!("Database ready");

    // --- Audit bus ---
    let bus = Arc::new(AuditBus::default());
    let persistence_handle = tokio::spawn(AuditPersistence::run(pool.clone(), bus.subscribe()));

    // --- Services ---
    let store = Arc::new(PgPresenceStore::new(pool.clone()));
    let registry = Arc::new(RegistryCache::new(store.clone(), config.presence.registry_ttl));
    let planner = DayPlanner::new(store.clone(), registry.clone(), bus.clone(), &config.presence);
    let presence = PresenceService::new(store, registry.clone(), &config.presence);

    let actor = match args.actor {
        Some(id) => StaffRepo::find_actor(&pool, id)
            .await
            .context("Failed to load actor")?,
        None => None,
    };
    if let (Some(id), None) = (args.actor, &actor) {
        tracing::warn!(user_id = id, "Actor not found, continuing unauthenticated");
    }

    let ctx = Services {
        pool: &pool,
        planner: &planner,
        presence: &presence,
        registry: registry.as_ref(),
    };
    let outcome = run(&ctx, actor.as_ref(), args.command).await;

    // Every sender must be gone before the persistence task can drain and exit.
    drop(planner);
    drop(bus);
    if let Err(e) = persistence_handle.await {
        tracing::error!(error = %e, "Audit persistence task failed");
    }
    pool.close().await;

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            let rendered = error::render(&err);
            eprintln!("{}", serde_json::to_string_pretty(&rendered.body)?);
            std::process::exit(rendered.exit_code);
        }
    }
}

struct Services<'a> {
    pool: &'a DbPool,
    planner: &'a DayPlanner,
    presence: &'a PresenceService,
    registry: &'a RegistryCache,
}

async fn run(ctx: &Services<'_>, actor: Option<&Actor>, command: Command) -> CoreResult<Value> {
    let value = match command {
        Command::Now { at } => {
            let at = at.unwrap_or_else(Utc::now);
            serde_json::to_value(ctx.presence.current_presences(actor, at).await?)
        }
        Command::Week { user, at } => {
            let at = at.unwrap_or_else(Utc::now);
            serde_json::to_value(ctx.presence.week_view(actor, user, at).await?)
        }
        Command::Day { date, user } => {
            serde_json::to_value(ctx.planner.day_schedule(actor, user, &date).await?)
        }
        Command::Plan {
            date,
            repeat_until,
            user,
            mut segments,
            notes,
        } => {
            if notes.is_some() {
                for seg in &mut segments {
                    seg.notes.clone_from(&notes);
                }
            }
            let req = PlanDayRequest {
                user_id: user,
                date,
                repeat_until,
                segments,
            };
            serde_json::to_value(ctx.planner.plan_day(actor, req).await?)
        }
        Command::Cancel { segment_id } => {
            ctx.planner.deactivate_segment(actor, segment_id).await?;
            Ok(serde_json::json!({ "success": true, "segmentId": segment_id }))
        }
        Command::History { segment_id } => {
            let actor = actor.ok_or_else(|| CoreError::Unauthorized("No authenticated actor".into()))?;
            if is_requester_role(actor) {
                return Err(CoreError::Forbidden("Audit history is visible to staff only".into()));
            }
            let entries = AuditLogRepo::list_for_entity(ctx.pool, ENTITY_STAFF_PRESENCE, segment_id)
                .await
                .map_err(CoreError::storage)?;
            serde_json::to_value(entries)
        }
        Command::Statuses => serde_json::to_value(ctx.registry.active_statuses().await?),
        Command::StatusActive { code, active } => {
            let actor = actor.ok_or_else(|| CoreError::Unauthorized("No authenticated actor".into()))?;
            if !can_manage_registry(actor) {
                return Err(CoreError::Forbidden("Only admins can change presence statuses".into()));
            }
            let code = code.trim().to_uppercase();
            let changed = PresenceStatusRepo::set_active(ctx.pool, &code, active)
                .await
                .map_err(CoreError::storage)?;
            if !changed {
                return Err(CoreError::field("code", format!("Unknown status code {code}")));
            }
            ctx.registry.invalidate().await;
            tracing::info!(actor_id = actor.id, code = %code, active, "Presence status updated");
            Ok(serde_json::json!({ "code": code, "isActive": active }))
        }
        Command::Offices => serde_json::to_value(ctx.registry.active_offices().await?),
    };
    value.map_err(CoreError::storage)
}
