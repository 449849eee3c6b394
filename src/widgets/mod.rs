pub mod magnitude_slider;
