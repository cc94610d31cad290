#![no_main]
use fmri_glm::NiftiHeader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = NiftiHeader::from_reader(data) {
        let _ = header.shape();
        let _ = header.data_type();
        let _ = header.data_len();
        let _ = header.qform();
        let _ = header.sform();
        let _ = header.intent();
        let _ = header.xyzt_units();
        let _ = header.affine();
        let _ = header.description();
    }
});
