pub mod autoplay;
pub mod input;
pub mod layout;
pub mod notes;
pub mod router;
pub mod session;
pub mod visualizer;

#[cfg(feature = "audio")]
pub mod clips;
#[cfg(feature = "audio")]
pub mod mixer;
#[cfg(feature = "audio")]
pub mod output;

#[cfg(feature = "desktop")]
pub mod pixel_font;

#[cfg(all(feature = "desktop", feature = "audio"))]
pub mod desktop_frontend;
