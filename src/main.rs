use {
    clap::{crate_description, crate_name, Arg, Command},
    log::*,
    std::{
        fs::File,
        process::exit,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread::{sleep, Builder},
        time::Duration,
    },
    tpu_proxy::proxy::{ProxyConfig, TxProxy, TX_PROXY_PORT},
};

fn setup_logger(log_file: Option<&str>, debug: bool) -> Result<(), std::io::Error> {
    let mut builder = env_logger::Builder::new();
    // keep the sink wide open and gate verbosity through the global max
    // level so SIGUSR1 can toggle it at runtime
    builder.filter_level(LevelFilter::Debug);
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    log::set_max_level(if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    Ok(())
}

fn main() {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .arg(
            Arg::new("rpc_host")
                .short('r')
                .value_name("HOST[:PORT[:PORT2]]")
                .takes_value(true)
                .default_value("localhost")
                .help("RPC node to track (HTTP port, then WebSocket port)"),
        )
        .arg(
            Arg::new("listen_port")
                .short('p')
                .value_name("PORT")
                .takes_value(true)
                .help("TCP port to accept submissions on"),
        )
        .arg(
            Arg::new("log_file")
                .short('l')
                .value_name("FILE")
                .takes_value(true)
                .help("Write the log to FILE instead of stderr"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .takes_value(false)
                .help("Enable debug logging"),
        )
        .get_matches();

    let config = ProxyConfig {
        rpc_host: matches.value_of("rpc_host").unwrap().to_string(),
        listen_port: matches
            .value_of("listen_port")
            .map(|port| match port.parse() {
                Ok(port) => port,
                Err(_) => {
                    eprintln!("tpu-proxy: invalid listen port {}", port);
                    exit(1);
                }
            })
            .unwrap_or(TX_PROXY_PORT),
    };

    let debug = matches.is_present("debug");
    if let Err(err) = setup_logger(matches.value_of("log_file"), debug) {
        eprintln!("tpu-proxy: failed to open log file: {}", err);
        exit(1);
    }

    let exit_flag = Arc::new(AtomicBool::new(false));
    for signal in [
        signal_hook::consts::SIGINT,
        signal_hook::consts::SIGHUP,
        signal_hook::consts::SIGTERM,
    ] {
        if let Err(err) = signal_hook::flag::register(signal, exit_flag.clone()) {
            eprintln!("tpu-proxy: failed to register signal handler: {}", err);
            exit(1);
        }
    }

    // SIGUSR1 toggles between info and debug logging
    let toggle_flag = Arc::new(AtomicBool::new(false));
    if let Err(err) = signal_hook::flag::register(signal_hook::consts::SIGUSR1, toggle_flag.clone())
    {
        eprintln!("tpu-proxy: failed to register signal handler: {}", err);
        exit(1);
    }
    {
        let exit_flag = exit_flag.clone();
        Builder::new()
            .name("txProxyLogLvl".to_string())
            .spawn(move || {
                while !exit_flag.load(Ordering::Relaxed) {
                    if toggle_flag.swap(false, Ordering::Relaxed) {
                        let level = match log::max_level() {
                            LevelFilter::Debug => LevelFilter::Info,
                            _ => LevelFilter::Debug,
                        };
                        log::set_max_level(level);
                        info!("log level now {}", level);
                    }
                    sleep(Duration::from_millis(250));
                }
            })
            .unwrap();
    }

    let mut proxy = match TxProxy::new(&config, exit_flag.clone()) {
        Ok(proxy) => proxy,
        Err(err) => {
            eprintln!("tpu-proxy: {}", err);
            exit(1);
        }
    };

    if let Err(err) = proxy.run() {
        eprintln!("tpu-proxy: {}", err);
        exit(1);
    }
}
