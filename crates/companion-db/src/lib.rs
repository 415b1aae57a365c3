//! Companion Database Layer
//!
//! Repository traits for organizations, members, templates, invitations and review
//! requests, with PostgreSQL and in-memory implementations.

pub mod db;
pub mod seed;

pub use db::{
    create_repositories, InvitationRepository, ManagedReview, MemoryDatabase, NewAccount,
    OrganizationRepository, Repositories, ReviewRepository, TemplateRepository, UserRepository,
};
pub use seed::seed_standard_templates;
