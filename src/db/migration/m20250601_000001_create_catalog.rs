//! Initial schema migration
//!
//! Creates the full Lyceum schema:
//! - users and authentication (users, refresh_tokens, otp_codes)
//! - catalog content (courses, modules, lessons, materials)
//! - ordered mapper tables linking each level of the hierarchy
//! - enrollments and per-lesson progress
//! - study workspaces
//!
//! Mapper foreign keys cascade on delete so a deleted material can never
//! leave a dangling mapper row behind.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // =====================================================================
        // Users and authentication
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::IsVerified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsPro).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::TokenVersion).integer().not_null().default(1))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RefreshTokens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RefreshTokens::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RefreshTokens::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(RefreshTokens::TokenHash)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RefreshTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RefreshTokens::RevokedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(RefreshTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refresh_tokens_user")
                            .from(RefreshTokens::Table, RefreshTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtpCodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OtpCodes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OtpCodes::UserId).uuid().not_null())
                    .col(ColumnDef::new(OtpCodes::CodeHash).string().not_null())
                    .col(ColumnDef::new(OtpCodes::Purpose).string().not_null())
                    .col(
                        ColumnDef::new(OtpCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OtpCodes::ConsumedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(OtpCodes::Attempts).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(OtpCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_otp_codes_user")
                            .from(OtpCodes::Table, OtpCodes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otp_codes_user_purpose")
                    .table(OtpCodes::Table)
                    .col(OtpCodes::UserId)
                    .col(OtpCodes::Purpose)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // =====================================================================
        // Catalog content
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).text().not_null())
                    .col(ColumnDef::new(Courses::Level).string().not_null())
                    .col(ColumnDef::new(Courses::DurationHours).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Courses::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Courses::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Modules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Modules::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Modules::Title).string().not_null())
                    .col(ColumnDef::new(Modules::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Modules::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lessons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lessons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Lessons::Name).string().not_null())
                    .col(ColumnDef::new(Lessons::Description).text().not_null())
                    .col(ColumnDef::new(Lessons::Position).integer().not_null().default(0))
                    .col(ColumnDef::new(Lessons::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Lessons::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // =====================================================================
        // Materials
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(QuizGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QuizGroups::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(QuizGroups::Title).string().not_null())
                    .col(ColumnDef::new(QuizGroups::Description).text().null())
                    .col(
                        ColumnDef::new(QuizGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizGroups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Quizzes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quizzes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Quizzes::Question).text().not_null())
                    .col(ColumnDef::new(Quizzes::Options).json_binary().not_null())
                    .col(ColumnDef::new(Quizzes::AnswerIndex).integer().not_null())
                    .col(ColumnDef::new(Quizzes::Explanation).text().null())
                    .col(ColumnDef::new(Quizzes::QuizGroupId).uuid().null())
                    .col(ColumnDef::new(Quizzes::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Quizzes::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quizzes_quiz_group")
                            .from(Quizzes::Table, Quizzes::QuizGroupId)
                            .to(QuizGroups::Table, QuizGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Videos::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Videos::Title).string().not_null())
                    .col(ColumnDef::new(Videos::Url).string().not_null())
                    .col(ColumnDef::new(Videos::DurationMinutes).integer().not_null().default(0))
                    .col(ColumnDef::new(Videos::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Videos::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Resources::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Resources::Title).string().not_null())
                    .col(ColumnDef::new(Resources::Url).string().not_null())
                    .col(ColumnDef::new(Resources::Description).text().null())
                    .col(ColumnDef::new(Resources::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Resources::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Articles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Articles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Articles::Title).string().not_null())
                    .col(ColumnDef::new(Articles::Body).text().not_null())
                    .col(ColumnDef::new(Articles::ReadingMinutes).integer().not_null().default(0))
                    .col(ColumnDef::new(Articles::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Articles::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // =====================================================================
        // Mapper tables
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(CourseMappers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CourseMappers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CourseMappers::CourseId).uuid().not_null())
                    .col(ColumnDef::new(CourseMappers::ModuleId).uuid().not_null())
                    .col(ColumnDef::new(CourseMappers::Position).integer().not_null())
                    .col(
                        ColumnDef::new(CourseMappers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_mappers_course")
                            .from(CourseMappers::Table, CourseMappers::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_mappers_module")
                            .from(CourseMappers::Table, CourseMappers::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_course_mappers_course_module")
                    .table(CourseMappers::Table)
                    .col(CourseMappers::CourseId)
                    .col(CourseMappers::ModuleId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LessonMappers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LessonMappers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LessonMappers::ModuleId).uuid().not_null())
                    .col(ColumnDef::new(LessonMappers::LessonId).uuid().not_null())
                    .col(ColumnDef::new(LessonMappers::Position).integer().not_null())
                    .col(
                        ColumnDef::new(LessonMappers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_mappers_module")
                            .from(LessonMappers::Table, LessonMappers::ModuleId)
                            .to(Modules::Table, Modules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_mappers_lesson")
                            .from(LessonMappers::Table, LessonMappers::LessonId)
                            .to(Lessons::Table, Lessons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_lesson_mappers_module_lesson")
                    .table(LessonMappers::Table)
                    .col(LessonMappers::ModuleId)
                    .col(LessonMappers::LessonId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One nullable FK column per material type; the application writes
        // exactly one. Cascades make dangling mapper rows impossible.
        manager
            .create_table(
                Table::create()
                    .table(MaterialMappers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MaterialMappers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(MaterialMappers::LessonId).uuid().not_null())
                    .col(ColumnDef::new(MaterialMappers::VideoId).uuid().null())
                    .col(ColumnDef::new(MaterialMappers::QuizId).uuid().null())
                    .col(ColumnDef::new(MaterialMappers::QuizGroupId).uuid().null())
                    .col(ColumnDef::new(MaterialMappers::ResourceId).uuid().null())
                    .col(ColumnDef::new(MaterialMappers::ArticleId).uuid().null())
                    .col(ColumnDef::new(MaterialMappers::Position).integer().not_null())
                    .col(
                        ColumnDef::new(MaterialMappers::DurationMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MaterialMappers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_lesson")
                            .from(MaterialMappers::Table, MaterialMappers::LessonId)
                            .to(Lessons::Table, Lessons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_video")
                            .from(MaterialMappers::Table, MaterialMappers::VideoId)
                            .to(Videos::Table, Videos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_quiz")
                            .from(MaterialMappers::Table, MaterialMappers::QuizId)
                            .to(Quizzes::Table, Quizzes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_quiz_group")
                            .from(MaterialMappers::Table, MaterialMappers::QuizGroupId)
                            .to(QuizGroups::Table, QuizGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_resource")
                            .from(MaterialMappers::Table, MaterialMappers::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_mappers_article")
                            .from(MaterialMappers::Table, MaterialMappers::ArticleId)
                            .to(Articles::Table, Articles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("uq_material_mappers_lesson_video", MaterialMappers::VideoId),
            ("uq_material_mappers_lesson_quiz", MaterialMappers::QuizId),
            ("uq_material_mappers_lesson_quiz_group", MaterialMappers::QuizGroupId),
            ("uq_material_mappers_lesson_resource", MaterialMappers::ResourceId),
            ("uq_material_mappers_lesson_article", MaterialMappers::ArticleId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(MaterialMappers::Table)
                        .col(MaterialMappers::LessonId)
                        .col(col)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        // =====================================================================
        // Career paths and roadmaps
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(CareerPaths::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CareerPaths::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CareerPaths::Title).string().not_null())
                    .col(ColumnDef::new(CareerPaths::Description).text().not_null())
                    .col(
                        ColumnDef::new(CareerPaths::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CareerPaths::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CareerPaths::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roadmaps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roadmaps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Roadmaps::Title).string().not_null())
                    .col(ColumnDef::new(Roadmaps::Description).text().not_null())
                    .col(
                        ColumnDef::new(Roadmaps::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Roadmaps::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Roadmaps::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CareerPathMappers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CareerPathMappers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CareerPathMappers::CareerPathId).uuid().not_null())
                    .col(ColumnDef::new(CareerPathMappers::RoadmapId).uuid().not_null())
                    .col(ColumnDef::new(CareerPathMappers::Position).integer().not_null())
                    .col(
                        ColumnDef::new(CareerPathMappers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_career_path_mappers_career_path")
                            .from(CareerPathMappers::Table, CareerPathMappers::CareerPathId)
                            .to(CareerPaths::Table, CareerPaths::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_career_path_mappers_roadmap")
                            .from(CareerPathMappers::Table, CareerPathMappers::RoadmapId)
                            .to(Roadmaps::Table, Roadmaps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_career_path_mappers_pair")
                    .table(CareerPathMappers::Table)
                    .col(CareerPathMappers::CareerPathId)
                    .col(CareerPathMappers::RoadmapId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoadmapMappers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoadmapMappers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RoadmapMappers::RoadmapId).uuid().not_null())
                    .col(ColumnDef::new(RoadmapMappers::CourseId).uuid().not_null())
                    .col(ColumnDef::new(RoadmapMappers::Position).integer().not_null())
                    .col(
                        ColumnDef::new(RoadmapMappers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roadmap_mappers_roadmap")
                            .from(RoadmapMappers::Table, RoadmapMappers::RoadmapId)
                            .to(Roadmaps::Table, Roadmaps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roadmap_mappers_course")
                            .from(RoadmapMappers::Table, RoadmapMappers::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_roadmap_mappers_pair")
                    .table(RoadmapMappers::Table)
                    .col(RoadmapMappers::RoadmapId)
                    .col(RoadmapMappers::CourseId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // =====================================================================
        // Enrollments and progress
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Enrollments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Enrollments::UserId).uuid().not_null())
                    .col(ColumnDef::new(Enrollments::CourseId).uuid().not_null())
                    .col(ColumnDef::new(Enrollments::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(Enrollments::CancelledAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Enrollments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_user")
                            .from(Enrollments::Table, Enrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_course")
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Backs the already-enrolled invariant at the schema level
        manager
            .create_index(
                Index::create()
                    .name("uq_enrollments_user_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::UserId)
                    .col(Enrollments::CourseId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoadmapEnrollments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoadmapEnrollments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RoadmapEnrollments::UserId).uuid().not_null())
                    .col(ColumnDef::new(RoadmapEnrollments::RoadmapId).uuid().not_null())
                    .col(
                        ColumnDef::new(RoadmapEnrollments::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RoadmapEnrollments::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RoadmapEnrollments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoadmapEnrollments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roadmap_enrollments_user")
                            .from(RoadmapEnrollments::Table, RoadmapEnrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roadmap_enrollments_roadmap")
                            .from(RoadmapEnrollments::Table, RoadmapEnrollments::RoadmapId)
                            .to(Roadmaps::Table, Roadmaps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_roadmap_enrollments_user_roadmap")
                    .table(RoadmapEnrollments::Table)
                    .col(RoadmapEnrollments::UserId)
                    .col(RoadmapEnrollments::RoadmapId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CareerEnrollments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CareerEnrollments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CareerEnrollments::UserId).uuid().not_null())
                    .col(ColumnDef::new(CareerEnrollments::CareerPathId).uuid().not_null())
                    .col(
                        ColumnDef::new(CareerEnrollments::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CareerEnrollments::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CareerEnrollments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CareerEnrollments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_career_enrollments_user")
                            .from(CareerEnrollments::Table, CareerEnrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_career_enrollments_career_path")
                            .from(CareerEnrollments::Table, CareerEnrollments::CareerPathId)
                            .to(CareerPaths::Table, CareerPaths::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_career_enrollments_user_career_path")
                    .table(CareerEnrollments::Table)
                    .col(CareerEnrollments::UserId)
                    .col(CareerEnrollments::CareerPathId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CourseProgress::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CourseProgress::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CourseProgress::UserId).uuid().not_null())
                    .col(ColumnDef::new(CourseProgress::LessonId).uuid().not_null())
                    .col(
                        ColumnDef::new(CourseProgress::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_progress_user")
                            .from(CourseProgress::Table, CourseProgress::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_progress_lesson")
                            .from(CourseProgress::Table, CourseProgress::LessonId)
                            .to(Lessons::Table, Lessons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_course_progress_user_lesson")
                    .table(CourseProgress::Table)
                    .col(CourseProgress::UserId)
                    .col(CourseProgress::LessonId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // =====================================================================
        // Study workspaces
        // =====================================================================

        manager
            .create_table(
                Table::create()
                    .table(Workspaces::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Workspaces::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Workspaces::UserId).uuid().not_null())
                    .col(ColumnDef::new(Workspaces::Title).string().not_null())
                    .col(ColumnDef::new(Workspaces::Kind).string().not_null())
                    .col(ColumnDef::new(Workspaces::SourceUrl).string().not_null())
                    .col(ColumnDef::new(Workspaces::Position).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Workspaces::LastOpenedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workspaces_user")
                            .from(Workspaces::Table, Workspaces::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workspaces_user_last_opened")
                    .table(Workspaces::Table)
                    .col(Workspaces::UserId)
                    .col(Workspaces::LastOpenedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse dependency order
        manager.drop_table(Table::drop().table(Workspaces::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(CourseProgress::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(CareerEnrollments::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(RoadmapEnrollments::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Enrollments::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(RoadmapMappers::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(CareerPathMappers::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Roadmaps::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(CareerPaths::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(MaterialMappers::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(LessonMappers::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(CourseMappers::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Articles::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Resources::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Videos::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Quizzes::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(QuizGroups::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Lessons::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Modules::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Courses::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(OtpCodes::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(RefreshTokens::Table).if_exists().to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).if_exists().to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Role,
    IsActive,
    IsVerified,
    IsPro,
    TokenVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RefreshTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    ExpiresAt,
    RevokedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OtpCodes {
    Table,
    Id,
    UserId,
    CodeHash,
    Purpose,
    ExpiresAt,
    ConsumedAt,
    Attempts,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Title,
    Description,
    Level,
    DurationHours,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Modules {
    Table,
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lessons {
    Table,
    Id,
    Name,
    Description,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum QuizGroups {
    Table,
    Id,
    Title,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Quizzes {
    Table,
    Id,
    Question,
    Options,
    AnswerIndex,
    Explanation,
    QuizGroupId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Videos {
    Table,
    Id,
    Title,
    Url,
    DurationMinutes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    Title,
    Url,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Articles {
    Table,
    Id,
    Title,
    Body,
    ReadingMinutes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseMappers {
    Table,
    Id,
    CourseId,
    ModuleId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LessonMappers {
    Table,
    Id,
    ModuleId,
    LessonId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MaterialMappers {
    Table,
    Id,
    LessonId,
    VideoId,
    QuizId,
    QuizGroupId,
    ResourceId,
    ArticleId,
    Position,
    DurationMinutes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CareerPaths {
    Table,
    Id,
    Title,
    Description,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Roadmaps {
    Table,
    Id,
    Title,
    Description,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CareerPathMappers {
    Table,
    Id,
    CareerPathId,
    RoadmapId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RoadmapMappers {
    Table,
    Id,
    RoadmapId,
    CourseId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    UserId,
    CourseId,
    Progress,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoadmapEnrollments {
    Table,
    Id,
    UserId,
    RoadmapId,
    Progress,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CareerEnrollments {
    Table,
    Id,
    UserId,
    CareerPathId,
    Progress,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseProgress {
    Table,
    Id,
    UserId,
    LessonId,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
    UserId,
    Title,
    Kind,
    SourceUrl,
    Position,
    LastOpenedAt,
    CreatedAt,
    UpdatedAt,
}
