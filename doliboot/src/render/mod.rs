//! Configuration rendering.
//!
//! - `php_ini`: in-place directive rewrite of the PHP runtime config
//! - `app_conf`: write-once application config holding the DB credentials

pub mod app_conf;
pub mod php_ini;

pub use app_conf::render_app_conf;
pub use php_ini::render_php_ini;
