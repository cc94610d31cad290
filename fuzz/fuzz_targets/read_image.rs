#![no_main]
use fmri_glm::{cifti, NiftiImage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = NiftiImage::from_reader(data) {
        let _ = cifti::matrix(&image);
        let _ = cifti::xml(&image);
    }
});
