use clap::Parser;
use morsel::cli::{
    handle_analyze, handle_chain, handle_completions, handle_config_init, Cli, Commands,
    ConfigCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => morsel::cli::serve::run_serve(args).await,
        Commands::Analyze(args) => handle_analyze(&args).await.map(|output| {
            println!("{}", output);
        }),
        Commands::Chain(args) => handle_chain(&args).map(|output| {
            println!("{}", output);
        }),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
