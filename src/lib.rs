pub mod core {
    pub mod config;
    pub mod error;
    pub mod startup;
    pub mod tracing_init;
}

pub mod api {
    pub mod client;
    pub mod dry_run;
    pub mod torrent_client;
}

pub mod models {
    pub mod limits;
    pub mod notification;
    pub mod torrent;
}

pub mod notify {
    pub mod notifier;
    pub mod webhook;
}

pub mod share_limits {
    pub mod arbiter;
    pub mod cleanup;
    pub mod evaluator;
    pub mod group;
    pub mod guard;
    pub mod matcher;
    pub mod runner;
    #[cfg(test)]
    pub mod testing;
}

pub mod utils {
    pub mod path;
    pub mod time;
}
