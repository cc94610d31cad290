#![no_main]
use fmri_glm::cifti;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        for dimension in 0..3 {
            if let Some(map) = cifti::index_map(xml, dimension) {
                let _ = cifti::dense_scalar_xml(2, map);
            }
        }
    }
});
