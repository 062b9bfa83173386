pub mod image_capture;
