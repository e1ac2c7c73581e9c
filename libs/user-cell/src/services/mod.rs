pub mod profile;
pub mod roles;
pub mod specialties;
pub mod users;

pub use profile::ProfileService;
pub use roles::RoleService;
pub use specialties::SpecialtyService;
pub use users::UserService;
