pub mod video;

pub use video::add_video_session_transitions;
