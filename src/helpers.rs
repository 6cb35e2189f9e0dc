use std::io::Read;
use std::path::Path;
use gfx_maths::*;

/// Size of the buffer backend info logs are read into, terminator included.
pub const INFO_LOG_CAPACITY: usize = 1024;

pub fn load_string_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

// longer logs are cut, same as reading them into a fixed char buffer
pub fn truncate_info_log(log: &str) -> String {
    let max = INFO_LOG_CAPACITY - 1;
    if log.len() <= max {
        return log.trim_end_matches('\0').to_string();
    }
    let mut end = max;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

pub fn calculate_model_matrix(position: Vec3, rotation: Quaternion, scale: Vec3) -> Mat4 {
    let mut model_matrix = Mat4::identity();
    model_matrix = model_matrix * Mat4::translate(position);
    model_matrix = model_matrix * Mat4::rotate(rotation);
    model_matrix = model_matrix * Mat4::scale(scale);
    model_matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_logs_are_untouched() {
        assert_eq!(truncate_info_log("0:1(1): error: oops\n"), "0:1(1): error: oops\n");
    }

    #[test]
    fn long_logs_are_capped() {
        let log = "x".repeat(5000);
        assert_eq!(truncate_info_log(&log).len(), INFO_LOG_CAPACITY - 1);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let log = "é".repeat(1000);
        let cut = truncate_info_log(&log);
        assert!(cut.len() < INFO_LOG_CAPACITY);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_string_from_file("definitely/not/here.glsl").is_err());
    }

    #[test]
    fn identity_transform_gives_identity_model() {
        let m = calculate_model_matrix(Vec3::new(0.0, 0.0, 0.0), Quaternion::new(0.0, 0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(m.values, Mat4::identity().values);
    }

    #[test]
    fn half_turn_in_radians() {
        assert!((degrees_to_radians(180.0) - std::f32::consts::PI).abs() < 1e-6);
    }
}
