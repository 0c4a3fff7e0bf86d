use crate::demo::{run_demo, run_doctor_lookup, DemoArgs, DoctorLookupArgs};
use crate::server;
use appointment_intake::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Appointment Intake",
    about = "Serve and exercise the doctor appointment intake workflow from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the doctors a patient is eligible to see
    Doctors(DoctorLookupArgs),
    /// Walk through a scripted intake session and submit the request
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Doctors(args) => run_doctor_lookup(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
