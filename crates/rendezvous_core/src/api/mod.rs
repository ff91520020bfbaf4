pub mod json_api;

pub use json_api::{
    handle_request_json, scheduler_from_config_json, HostCommand, HostRequest, HostResponse,
    HostResponseBody,
};
