//! SeaORM entities for the Lyceum catalog, enrollments and users
//!
//! Catalog content is composed through explicit mapper tables carrying a
//! `position` column (course -> module -> lesson -> material, and
//! career path -> roadmap -> course above it).

pub mod article;
pub mod career_enrollment;
pub mod career_path;
pub mod career_path_mapper;
pub mod course;
pub mod course_mapper;
pub mod course_progress;
pub mod enrollment;
pub mod lesson;
pub mod lesson_mapper;
pub mod material_mapper;
pub mod module;
pub mod otp_code;
pub mod quiz;
pub mod quiz_group;
pub mod refresh_token;
pub mod resource;
pub mod roadmap;
pub mod roadmap_enrollment;
pub mod roadmap_mapper;
pub mod user;
pub mod video;
pub mod workspace;

pub use material_mapper::{MaterialKind, MaterialRef};
