use clap::{Arg, ArgMatches, Command};
use reply_translate::{
    BotConfig, ConfigStore, ProviderKind, SettingsUpdate, TenantId, TranslationPipeline,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn guild_arg(required: bool) -> Arg {
    Arg::new("guild")
        .long("guild")
        .short('g')
        .help("Tenant (guild) id")
        .value_parser(clap::value_parser!(u64))
        .required(required)
}

fn channel_arg() -> Arg {
    Arg::new("channel")
        .help("Channel id")
        .value_parser(clap::value_parser!(u64))
        .required(true)
        .index(1)
}

fn language_arg() -> Arg {
    Arg::new("language")
        .help("Language code as reported by providers (e.g. ID, ET)")
        .required(true)
        .index(1)
}

fn cli() -> Command {
    Command::new("reply-translate")
        .version("0.1.0")
        .about("Best-effort chat message translation")
        .subcommand_required(true)
        .subcommand(
            Command::new("translate")
                .about("Run one text through the translation pipeline")
                .arg(
                    Arg::new("text")
                        .help("Text to translate")
                        .required(true)
                        .index(1),
                )
                .arg(guild_arg(false))
                .arg(
                    Arg::new("auto")
                        .long("auto")
                        .help("Apply automatic-mode heuristics instead of forcing")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show a tenant's translation status")
                .arg(guild_arg(true)),
        )
        .subcommand(
            Command::new("channels")
                .about("Manage channels with automatic translation")
                .subcommand_required(true)
                .arg(guild_arg(true))
                .subcommand(Command::new("add").arg(channel_arg()))
                .subcommand(Command::new("remove").arg(channel_arg()))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("blacklist")
                .about("Manage source languages that are never translated")
                .subcommand_required(true)
                .arg(guild_arg(true))
                .subcommand(Command::new("add").arg(language_arg()))
                .subcommand(Command::new("remove").arg(language_arg()))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("settings")
                .about("Show or change a tenant's provider settings")
                .subcommand_required(true)
                .arg(guild_arg(true))
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("provider")
                                .long("provider")
                                .help("deepl, libre, lingva or simply")
                                .value_parser(clap::value_parser!(ProviderKind)),
                        )
                        .arg(Arg::new("deepl-key").long("deepl-key"))
                        .arg(Arg::new("libre-url").long("libre-url"))
                        .arg(Arg::new("libre-key").long("libre-key"))
                        .arg(Arg::new("lingva-url").long("lingva-url"))
                        .arg(Arg::new("simply-url").long("simply-url")),
                ),
        )
}

fn guild(matches: &ArgMatches) -> Option<TenantId> {
    matches.get_one::<u64>("guild").copied()
}

fn settings_update(matches: &ArgMatches) -> SettingsUpdate {
    let text = |id: &str| matches.get_one::<String>(id).cloned();
    SettingsUpdate {
        provider: matches.get_one::<ProviderKind>("provider").copied(),
        deepl_api_key: text("deepl-key"),
        libre_url: text("libre-url"),
        libre_api_key: text("libre-key"),
        lingva_url: text("lingva-url"),
        simply_url: text("simply-url"),
    }
}

fn print_list<T: std::fmt::Display>(items: &[T]) {
    if items.is_empty() {
        println!("(none)");
    }
    for item in items {
        println!("{}", item);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BotConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let store = Arc::new(ConfigStore::load(config.config_path.clone()).await);
    let pipeline = TranslationPipeline::new(config, Arc::clone(&store));

    match matches.subcommand() {
        Some(("translate", sub)) => {
            // Required by clap
            let text = sub.get_one::<String>("text").unwrap();
            let tenant = guild(sub);
            if sub.get_flag("auto") {
                match pipeline.translate(tenant, text, false, true).await {
                    Some(translated) => println!("{}", translated.text),
                    None => println!("(skipped)"),
                }
            } else {
                println!("{}", pipeline.handle_command(tenant, text).await);
            }
        }
        Some(("status", sub)) => {
            let tenant = guild(sub).unwrap();
            print!("{}", pipeline.status(tenant).await);
        }
        Some(("channels", sub)) => {
            let tenant = guild(sub).unwrap();
            match sub.subcommand() {
                Some(("add", args)) => {
                    let channel = *args.get_one::<u64>("channel").unwrap();
                    store.add_channel(tenant, channel).await?;
                    println!("Enabled auto-translate in <#{}>.", channel);
                }
                Some(("remove", args)) => {
                    let channel = *args.get_one::<u64>("channel").unwrap();
                    store.remove_channel(tenant, channel).await?;
                    println!("Disabled auto-translate in <#{}>.", channel);
                }
                _ => print_list(&store.list_channels(tenant).await),
            }
        }
        Some(("blacklist", sub)) => {
            let tenant = guild(sub).unwrap();
            match sub.subcommand() {
                Some(("add", args)) => {
                    let code = args.get_one::<String>("language").unwrap();
                    if store.add_blacklist(tenant, code).await? {
                        println!("Added {} to the blacklist.", code.trim().to_uppercase());
                    } else {
                        println!("Nothing added.");
                    }
                }
                Some(("remove", args)) => {
                    let code = args.get_one::<String>("language").unwrap();
                    if store.remove_blacklist(tenant, code).await? {
                        println!("Removed {} from the blacklist.", code.trim().to_uppercase());
                    } else {
                        println!("{} was not blacklisted.", code.trim().to_uppercase());
                    }
                }
                _ => print_list(&store.list_blacklist(tenant).await),
            }
        }
        Some(("settings", sub)) => {
            let tenant = guild(sub).unwrap();
            let settings = match sub.subcommand() {
                Some(("set", args)) => {
                    store.update_settings(tenant, &settings_update(args)).await?
                }
                _ => store.get_settings(tenant).await,
            };
            print_list(&settings.display_lines());
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}
