use std::sync::Arc;

use clap::{value_parser, Arg, ArgAction, Command};
use parking_lot::Mutex;

use dgo_content::DashboardConfig;
use dgo_engine::{
    ConnectorError, EngineConfig, LogNotifier, OrchestrationEngine, SourceConnector, SourceFetch,
    TriggerSurface,
};
use dgo_ledger::{
    CostModel, CreditLedger, MemoryBalanceStore, ScopeId, TransactionContext, TransactionKind,
    UsageMetrics,
};
use dgo_store::{Document, DocumentStore, MemoryStore, SyncSource, VersionStore};
use dgo_strategy::{
    CapabilityError, GenerationCapability, GenerationOutput, GenerationRequest,
};

/// Capability that renders a plain summary dashboard from the data profile
#[derive(Debug)]
struct TemplateCapability {
    name: &'static str,
    usage: UsageMetrics,
}

#[async_trait::async_trait]
impl GenerationCapability for TemplateCapability {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, CapabilityError> {
        let columns: Vec<String> = request
            .data_profile
            .columns
            .iter()
            .map(|c| format!("{} ({:?})", c.name, c.kind))
            .collect();
        let config = DashboardConfig::new(
            "Source Overview",
            serde_json::json!({
                "rows": request.data_profile.row_count,
                "columns": columns,
            }),
            format!(
                "<html><body><h1>Source Overview</h1><p>{} rows</p></body></html>",
                request.data_profile.row_count
            ),
            format!("Overview of {} rows", request.data_profile.row_count),
        );
        Ok(GenerationOutput {
            config,
            change_summary: format!("rendered by the {} engine", self.name),
            usage: self.usage,
        })
    }
}

/// Connector serving mutable in-memory content
#[derive(Debug, Default)]
struct LocalConnector {
    content: Mutex<String>,
}

impl LocalConnector {
    fn set(&self, content: &str) {
        *self.content.lock() = content.to_string();
    }
}

#[async_trait::async_trait]
impl SourceConnector for LocalConnector {
    async fn fetch_latest(
        &self,
        _connection_id: uuid::Uuid,
        _resource_id: &str,
    ) -> Result<SourceFetch, ConnectorError> {
        Ok(SourceFetch::new(self.content.lock().clone()))
    }
}

async fn run_demo(grant: u64) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let balances = Arc::new(MemoryBalanceStore::new());
    let ledger = CreditLedger::new(balances, CostModel::default());
    let connector = Arc::new(LocalConnector::default());

    // Zero freshness threshold so every demo pass reconsiders the document.
    let engine = Arc::new(OrchestrationEngine::new(
        EngineConfig::default().with_freshness_threshold_secs(0),
        store.clone(),
        ledger.clone(),
        Arc::new(TemplateCapability {
            name: "direct",
            usage: UsageMetrics::of(4_000, 1_200),
        }),
        Arc::new(TemplateCapability {
            name: "agentic",
            usage: UsageMetrics::of(0, 0),
        }),
        connector.clone(),
        Arc::new(LogNotifier),
    ));

    let scope = ScopeId::new();
    ledger
        .add(scope, grant, TransactionKind::Grant, TransactionContext::default())
        .await?;
    println!("granted {grant} credits to scope {scope}");

    let initial = "region,revenue\nwest,100\neast,200\nsouth,175\n";
    connector.set(initial);
    let doc = Document::new("revenue-by-region", scope, initial)
        .with_sync(SyncSource::new(uuid::Uuid::new_v4(), "sheet-1"));
    let id = doc.id;
    store.create(doc).await?;

    let receipt = engine.generate(id).await?;
    println!(
        "generated '{}' {} via {} path ({} credits)",
        receipt.document.slug,
        receipt.version.map(|v| v.to_string()).unwrap_or_default(),
        receipt.path,
        receipt.credits_charged.unwrap_or(0),
    );

    let surface = TriggerSurface::new(engine.clone(), "demo-secret");

    // First pass: nothing changed upstream.
    let summary = surface.trigger_sync("demo-secret").await?;
    println!(
        "sync pass 1: processed={} refreshed={} unchanged={}",
        summary.processed, summary.refreshed, summary.unchanged
    );

    // Upstream edit, second pass refreshes.
    connector.set("region,revenue\nwest,100\neast,250\nsouth,175\nnorth,90\n");
    let summary = surface.trigger_sync("demo-secret").await?;
    println!(
        "sync pass 2: processed={} refreshed={} unchanged={}",
        summary.processed, summary.refreshed, summary.unchanged
    );

    let reaped = surface.trigger_cleanup("demo-secret").await?;
    println!("reaper: scanned={} reaped={}", reaped.scanned, reaped.reaped);

    let versions = store.count(id).await?;
    let balance = ledger.balance(scope).await?;
    println!(
        "document now at {} with {} versions; balance {} ({} used)",
        store.fetch(id).await?.version,
        versions,
        balance.balance,
        balance.lifetime_used
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Command::new("dgo")
        .version(dgo_engine::VERSION)
        .about("Dashboard Generation Orchestrator")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("demo")
                .about("Run the full pipeline against an in-memory datastore")
                .arg(
                    Arg::new("grant")
                        .long("grant")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Credits granted to the demo scope"),
                ),
        )
        .subcommand(
            Command::new("cost")
                .about("Compute the credit cost of a usage sample")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .default_value("0")
                        .value_parser(value_parser!(u64))
                        .help("Input units consumed"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .default_value("0")
                        .value_parser(value_parser!(u64))
                        .help("Output units produced"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("demo", args)) => {
            let grant = *args.get_one::<u64>("grant").unwrap();
            run_demo(grant).await
        }
        Some(("cost", args)) => {
            let input = *args.get_one::<u64>("input").unwrap();
            let output = *args.get_one::<u64>("output").unwrap();
            let model = CostModel::default();
            let credits = model.credits_for(input, output);
            if args.get_flag("json") {
                println!(
                    "{}",
                    serde_json::json!({
                        "input_units": input,
                        "output_units": output,
                        "credits": credits,
                    })
                );
            } else {
                println!("{input} input + {output} output units = {credits} credits");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
