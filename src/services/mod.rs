/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match and roster management.
pub mod match_service;
/// Background supervision of the storage connection.
pub mod storage_supervisor;
/// Snake-draft balancing of a roster into teams.
pub mod team_balancer;
/// Team draws for stored matches and ad-hoc previews.
pub mod team_service;
