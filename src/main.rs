use modelview::app;
use modelview::config::ViewerConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ViewerConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            }
        },
        None => ViewerConfig::default(),
    };

    if let Err(err) = app::run(config) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
