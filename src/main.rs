use log::{LevelFilter, error, info};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use maillennia::{SessionConfig, SmtpServer};
use std::env;
use std::error::Error;

fn init_logging() -> Result<(), Box<dyn Error>> {
    let level = env::var("MAILLENNIA_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S%.f)} {h({l:<5})} {t} $ {m}{n}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;

    log4rs::init_config(config)?;
    Ok(())
}

fn main() {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let args: Vec<String> = env::args().collect();

    let addr = if args.len() > 1 {
        args[1].as_str()
    } else {
        "127.0.0.1:2525"
    };

    let hostname = if args.len() > 2 {
        args[2].as_str()
    } else {
        "maillennia.local"
    };

    info!("Starting Maillennia on {addr} as {hostname}");

    let server = SmtpServer::with_config(SessionConfig::new(hostname));
    if let Err(e) = server.start(addr) {
        error!("Failed to start server: {e}");
        std::process::exit(1);
    }
}
