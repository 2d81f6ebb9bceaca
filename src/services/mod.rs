//! Business logic services.

pub mod build_service;
pub mod download_service;
pub mod printer_service;
pub mod resolution_service;
