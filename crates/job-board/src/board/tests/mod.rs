mod common;
mod integrity;
mod service;
