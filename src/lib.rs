pub mod arrivals;
pub mod classify;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod scheduler;
pub mod snapshot;
pub mod stations;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
