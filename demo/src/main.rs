//! AuditSeal command-line front end.
//!
//! Wires the validator, enricher, signing authority, and repository from a
//! TOML config and drives the pipeline.
//!
//! Usage:
//!   auditseal --config auditseal.toml ingest events.json
//!   auditseal --config auditseal.toml verify --tenant t1
//!   auditseal --config auditseal.toml show 6f1c0e9a-...
//!   auditseal scenario
//!   auditseal stress --writers 8 --events 50
//!
//! With the default in-memory backend nothing outlives the process, so
//! `verify` and `show` are only useful against a sqlite backend.

mod wiring;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use auditseal_config::AuditSealConfig;
use auditseal_contracts::{
    ActionRequest, ActorRequest, AuditSealError, AuditSealResult, EventMetadataRequest,
    EventRequest, IntegrityStatus, ResourceRequest,
};
use auditseal_ingest::IngestionService;

// ── CLI definition ────────────────────────────────────────────────────────────

/// AuditSeal: a tamper-evident, multi-tenant audit event store.
#[derive(Parser)]
#[command(
    name = "auditseal",
    about = "Tamper-evident audit event store",
    long_about = "Validates, enriches, hash-chains, signs, and stores audit events,\n\
                  and verifies stored events and tenant chains."
)]
struct Cli {
    /// TOML configuration file.  Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest one event (JSON object) or a batch (JSON array) from a file.
    Ingest {
        file: PathBuf,
    },
    /// Verify linkage, hashes, and signatures of a tenant chain.
    Verify {
        #[arg(long)]
        tenant: String,
    },
    /// Print a stored event with its integrity status.
    Show {
        id: Uuid,
    },
    /// Store two linked events for tenant "t1" and verify them.
    Scenario,
    /// Hammer one tenant from many threads and verify the resulting chain.
    Stress {
        #[arg(long, default_value_t = 8)]
        writers: usize,
        #[arg(long, default_value_t = 50)]
        events: usize,
        #[arg(long, default_value = "stress")]
        tenant: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("auditseal: {}", e);
            std::process::exit(2);
        }
    };

    // RUST_LOG overrides the configured filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_target(false)
        .compact()
        .init();

    let result = wiring::ingestion_service(&config).and_then(|service| match cli.command {
        Command::Ingest { file } => run_ingest(&service, &file),
        Command::Verify { tenant } => run_verify(&service, &tenant),
        Command::Show { id } => run_show(&service, id),
        Command::Scenario => run_scenario(&service),
        Command::Stress {
            writers,
            events,
            tenant,
        } => run_stress(&service, writers, events, &tenant),
    });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("auditseal: {}", e);
            std::process::exit(if e.is_retryable() { 75 } else { 1 });
        }
    }
}

fn load_config(path: Option<&Path>) -> AuditSealResult<AuditSealConfig> {
    match path {
        Some(path) => AuditSealConfig::from_file(path),
        None => Ok(AuditSealConfig::default()),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────
//
// Each returns Ok(false) when it ran but found a problem worth a non-zero
// exit (rejected items, broken chain, tampered event).

fn run_ingest(service: &IngestionService, file: &Path) -> AuditSealResult<bool> {
    let contents = std::fs::read_to_string(file).map_err(|e| AuditSealError::ConfigError {
        reason: format!("failed to read '{}': {}", file.display(), e),
    })?;
    let value: serde_json::Value = serde_json::from_str(&contents).map_err(invalid_json)?;

    if value.is_array() {
        let requests: Vec<EventRequest> = serde_json::from_value(value).map_err(invalid_json)?;
        let report = service.ingest_batch(requests)?;
        print_json(&report)?;
        Ok(report.is_complete_success())
    } else {
        let request: EventRequest = serde_json::from_value(value).map_err(invalid_json)?;
        let sealed = service.ingest(request)?;
        print_json(&sealed)?;
        Ok(true)
    }
}

fn run_verify(service: &IngestionService, tenant: &str) -> AuditSealResult<bool> {
    let report = service.store().verify_tenant_chain(tenant)?;
    print_json(&report)?;
    Ok(report.is_valid())
}

fn run_show(service: &IngestionService, id: Uuid) -> AuditSealResult<bool> {
    let Some(sealed) = service.store().find_by_id(id)? else {
        println!("event {id} not found");
        return Ok(false);
    };
    let status = service.store().check_integrity(&sealed);
    print_json(&sealed)?;
    println!("integrity: {:?}", status);
    Ok(status.is_intact())
}

fn run_scenario(service: &IngestionService) -> AuditSealResult<bool> {
    println!();
    println!("AuditSeal scenario: two linked events for tenant t1");
    println!("===================================================");

    let first = service.ingest(scenario_request("t1", "u1", "CREATE", "doc-1"))?;
    println!("[1] stored {} previous={} hash={}", first.id(), first.previous_hash, first.hash);

    let second = service.ingest(scenario_request("t1", "u1", "CREATE", "doc-2"))?;
    println!("[2] stored {} previous={} hash={}", second.id(), second.previous_hash, second.hash);

    let linked = second.previous_hash == first.hash;
    println!("    second links to first: {}", linked);

    let store = service.store();
    let mut intact = true;
    for sealed in [&first, &second] {
        let status = store.verify_integrity(sealed.id())?;
        println!("    {} integrity: {:?}", sealed.id(), status);
        intact &= status.is_intact();
    }

    let unknown = store.verify_integrity(Uuid::new_v4())?;
    println!("    unknown id integrity: {:?}", unknown);

    let report = store.verify_tenant_chain("t1")?;
    println!(
        "    chain t1: length={} valid={}",
        report.length,
        report.is_valid()
    );
    println!();

    Ok(linked && intact && report.is_valid() && unknown == IntegrityStatus::NotFound)
}

fn run_stress(
    service: &IngestionService,
    writers: usize,
    events: usize,
    tenant: &str,
) -> AuditSealResult<bool> {
    let started = Instant::now();
    let failures: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..writers)
            .map(|w| {
                s.spawn(move || {
                    (0..events)
                        .filter(|i| {
                            let request = scenario_request(
                                tenant,
                                &format!("writer-{w}"),
                                "UPDATE",
                                &format!("doc-{i}"),
                            );
                            service.ingest(request).is_err()
                        })
                        .count()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(events))
            .sum()
    });
    let elapsed = started.elapsed();

    let report = service.store().verify_tenant_chain(tenant)?;
    println!(
        "stress: {} writers x {} events in {:.2?}, {} failed; chain length={} valid={}",
        writers,
        events,
        elapsed,
        failures,
        report.length,
        report.is_valid()
    );
    Ok(failures == 0 && report.is_valid())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

pub(crate) fn scenario_request(
    tenant: &str,
    actor: &str,
    action: &str,
    resource: &str,
) -> EventRequest {
    EventRequest {
        actor: ActorRequest {
            id: actor.to_string(),
            actor_type: "USER".to_string(),
            name: None,
            ip: Some("127.0.0.1".to_string()),
            user_agent: Some("auditseal-cli".to_string()),
            attributes: BTreeMap::new(),
        },
        action: ActionRequest {
            action_type: action.to_string(),
            description: None,
            category: None,
        },
        resource: ResourceRequest {
            id: resource.to_string(),
            resource_type: "DOCUMENT".to_string(),
            name: None,
            before: None,
            after: None,
        },
        metadata: Some(EventMetadataRequest {
            source: "cli".to_string(),
            tenant_id: tenant.to_string(),
            correlation_id: None,
            session_id: None,
            tags: BTreeMap::new(),
            extra: BTreeMap::new(),
        }),
    }
}

fn invalid_json(e: serde_json::Error) -> AuditSealError {
    AuditSealError::ValidationFailed {
        violations: vec![format!("malformed event JSON: {e}")],
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> AuditSealResult<()> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| AuditSealError::PersistenceFailed {
            reason: format!("failed to render output: {e}"),
        })?;
    println!("{rendered}");
    Ok(())
}
