//! Domain layer: plate matching, classification, and collaborator traits

pub mod repository;
pub mod service;
