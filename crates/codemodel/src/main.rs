use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use codemodel_core::{Decider, Inherit, KeepBodies, Model, ModelConfig, NodeRef, Strategy};
use codemodel_errors::Renderer;
use codemodel_source::JsonSource;
use salsa::DatabaseImpl;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "codemodel", about = "Inspect and reconcile declaration dumps")]
struct Options {
    /// Model configuration as a JSON file.
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,
    /// More log output; repeat for trace level. `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the declarations of a dump, or of one type in it.
    Show { dump: Utf8PathBuf, ty: Option<String> },
    /// List the properties of a type.
    Properties {
        dump: Utf8PathBuf,
        ty: String,
        /// Include properties inherited from super-types.
        #[arg(long)]
        all: bool,
    },
    /// List every super-type of a type, superclass first.
    Supertypes { dump: Utf8PathBuf, ty: String },
    /// Merge a type from `other` into the same type from `target` and print the result.
    Merge {
        target: Utf8PathBuf,
        other: Utf8PathBuf,
        ty: String,
        #[arg(long, value_enum, default_value_t = StrategyArg::MergeKeepBody)]
        strategy: StrategyArg,
        /// Never take bodies or initializers from `other` below the merged type.
        #[arg(long)]
        keep_bodies: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Keep,
    Override,
    MergeKeepBody,
    MergeOverrideBody,
}

impl From<StrategyArg> for Strategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Keep => Strategy::Keep,
            StrategyArg::Override => Strategy::Override,
            StrategyArg::MergeKeepBody => Strategy::MergeKeepBody,
            StrategyArg::MergeOverrideBody => Strategy::MergeOverrideBody,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    init_logging(options.verbose);

    let config = load_config(options.config.as_deref())?;
    let renderer = Renderer::styled();
    let db = DatabaseImpl::default();

    match options.command {
        Command::Show { dump, ty } => {
            let source = load_dump(&dump, &renderer)?;
            let names: Vec<String> = match ty {
                Some(ty) => vec![ty],
                None => source.type_names().map(str::to_owned).collect(),
            };

            let mut model = Model::with_source(&db, config, source);
            for name in names {
                let ty = model.type_named(&name)?;
                print!("{}", model.debug_tree(NodeRef::Type(ty)));
            }
        }
        Command::Properties { dump, ty, all } => {
            let source = load_dump(&dump, &renderer)?;
            let mut model = Model::with_source(&db, config, source);
            let ty = model.type_named(&ty)?;

            let properties =
                if all { model.all_properties(ty)? } else { model.declared_properties(ty) };
            for property in properties {
                let data = &model[property];
                let shown = data.ty().map_or_else(|| "?".to_owned(), |ty| model.display(ty));

                let mut parts = Vec::new();
                if data.field().is_some() {
                    parts.push("field");
                }
                if data.getter().is_some() {
                    parts.push("getter");
                }
                if data.setter().is_some() {
                    parts.push("setter");
                }
                let name = data.name().text(model.db());
                println!("{shown} {name} ({})", parts.join(", "));
            }
        }
        Command::Supertypes { dump, ty } => {
            let source = load_dump(&dump, &renderer)?;
            let mut model = Model::with_source(&db, config, source);
            let ty = model.type_named(&ty)?;

            for supertype in model.all_supertypes(ty)? {
                println!("{}", model.display(&supertype));
            }
        }
        Command::Merge { target, other, ty, strategy, keep_bodies } => {
            let target = load_dump(&target, &renderer)?;
            let other = load_dump(&other, &renderer)?;
            if !other.contains(&ty) {
                anyhow::bail!("`{ty}` is not declared in the dump to merge from");
            }

            let mut model = Model::with_source(&db, config, target);
            let reloaded = model.add_source(other);
            let ours = model.type_named(&ty)?;
            let theirs = model.load_detached(reloaded, &ty)?;

            let decider: &dyn Decider<'_> = if keep_bodies { &KeepBodies } else { &Inherit };
            model
                .merge(NodeRef::Type(ours), NodeRef::Type(theirs), decider, strategy.into())
                .with_context(|| format!("failed to merge `{ty}`"))?;
            print!("{}", model.debug_tree(NodeRef::Type(ours)));
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    // Targets are crate paths, so `codemodel` covers every crate of the workspace.
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("codemodel=warn")),
        1 => EnvFilter::new("codemodel=debug"),
        _ => EnvFilter::new("codemodel=trace"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn read(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))
}

fn load_config(path: Option<&Utf8Path>) -> anyhow::Result<ModelConfig> {
    let Some(path) = path else {
        return Ok(ModelConfig::default());
    };
    let text = read(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid configuration in `{path}`"))
}

fn load_dump(path: &Utf8Path, renderer: &Renderer) -> anyhow::Result<JsonSource> {
    let text = read(path)?;
    tracing::debug!(path = path.as_str(), bytes = text.len(), "read declaration dump");
    JsonSource::parse(&text).map_err(|diagnostic| {
        eprintln!("{}", diagnostic.render(renderer, path.as_str(), &text));
        anyhow::anyhow!("`{path}` is not a valid declaration dump")
    })
}
