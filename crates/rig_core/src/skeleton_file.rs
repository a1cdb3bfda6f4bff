//! Skeleton script files.
//!
//! One joint per line, parents listed before their children:
//!
//! ```text
//! create -joint hip -rotate <0, 0, 0> -translate <0, 1, 0>
//! create -joint knee -rotate <0, 0, 15> -translate <0, -1.5, 0> -parent hip
//! ```
//!
//! Rotation (degrees) and translation are local to the parent.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rig_math::Vec3;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkeletonFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: joint '{joint}' names parent '{parent}', which is not defined above it")]
    UnknownParent { line: usize, joint: String, parent: String },
}

/// One `create -joint` line.
#[derive(Debug, Clone, PartialEq)]
pub struct JointRecord {
    pub name: String,
    pub rotation: Vec3,
    pub translation: Vec3,
    pub parent: Option<String>,
}

impl JointRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            parent: None,
        }
    }
}

/// A parsed skeleton script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonFile {
    pub joints: Vec<JointRecord>,
}

impl SkeletonFile {
    /// Read and parse a script from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkeletonFileError> {
        let source = fs::read_to_string(path)?;
        source.parse()
    }

    /// Write the script to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SkeletonFileError> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

}

impl FromStr for SkeletonFile {
    type Err = SkeletonFileError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let mut joints: Vec<JointRecord> = Vec::new();

        for (i, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record = parse_line(line).map_err(|message| SkeletonFileError::Parse { line: i + 1, message })?;

            if joints.iter().any(|joint| joint.name == record.name) {
                return Err(SkeletonFileError::Parse {
                    line: i + 1,
                    message: format!("joint '{}' is already defined", record.name),
                });
            }

            if let Some(parent) = &record.parent {
                if !joints.iter().any(|joint| &joint.name == parent) {
                    return Err(SkeletonFileError::UnknownParent {
                        line: i + 1,
                        joint: record.name,
                        parent: parent.clone(),
                    });
                }
            }
            joints.push(record);
        }

        Ok(Self { joints })
    }
}

impl fmt::Display for SkeletonFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for joint in &self.joints {
            let r = joint.rotation;
            let t = joint.translation;
            write!(
                f,
                "create -joint {} -rotate <{}, {}, {}> -translate <{}, {}, {}>",
                joint.name, r.x, r.y, r.z, t.x, t.y, t.z
            )?;
            if let Some(parent) = &joint.parent {
                write!(f, " -parent {}", parent)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> Result<JointRecord, String> {
    let mut tokens = line.split_whitespace();

    match tokens.next() {
        Some("create") => {}
        Some(other) => return Err(format!("expected 'create', found '{}'", other)),
        None => return Err("empty line".to_string()),
    }

    let mut record: Option<JointRecord> = None;
    let mut rotation = None;
    let mut translation = None;
    let mut parent = None;

    while let Some(flag) = tokens.next() {
        match flag {
            "-joint" => {
                let name = tokens.next().ok_or("missing name after -joint")?;
                record = Some(JointRecord::new(name));
            }
            "-rotate" => rotation = Some(parse_vector(&mut tokens)?),
            "-translate" => translation = Some(parse_vector(&mut tokens)?),
            "-parent" => {
                let name = tokens.next().ok_or("missing name after -parent")?;
                parent = Some(name.to_string());
            }
            other => return Err(format!("unknown flag '{}'", other)),
        }
    }

    let mut record = record.ok_or("missing -joint")?;
    record.rotation = rotation.unwrap_or(Vec3::ZERO);
    record.translation = translation.unwrap_or(Vec3::ZERO);
    record.parent = parent;
    Ok(record)
}

/// Parse `<x, y, z>`, which may be split across several whitespace tokens.
fn parse_vector<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Vec3, String> {
    let mut text = String::new();
    for token in tokens.by_ref() {
        text.push_str(token);
        if token.ends_with('>') {
            break;
        }
    }

    let inner = text
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| format!("malformed vector '{}'", text))?;

    let components = inner
        .split(',')
        .map(|c| c.trim().parse::<f32>().map_err(|e| format!("bad number '{}': {}", c.trim(), e)))
        .collect::<Result<Vec<_>, _>>()?;

    match components.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected 3 components in '{}'", text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
create -joint hip -rotate <0, 90, 0> -translate <0, 1.5, 0>
# comment lines are ignored

create -joint knee -rotate <0, 0, 15> -translate <0, -1.5, 0.25> -parent hip
";

    #[test]
    fn test_parse() {
        let file: SkeletonFile = SCRIPT.parse().unwrap();
        assert_eq!(file.joints.len(), 2);

        let hip = &file.joints[0];
        assert_eq!(hip.name, "hip");
        assert_eq!(hip.rotation, Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(hip.translation, Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(hip.parent, None);

        let knee = &file.joints[1];
        assert_eq!(knee.translation, Vec3::new(0.0, -1.5, 0.25));
        assert_eq!(knee.parent.as_deref(), Some("hip"));
    }

    #[test]
    fn test_write_then_parse_keeps_joints() {
        let file: SkeletonFile = SCRIPT.parse().unwrap();
        let written = file.to_string();

        assert!(written.starts_with("create -joint hip -rotate <0, 90, 0> -translate <0, 1.5, 0>\n"));
        assert_eq!(written.parse::<SkeletonFile>().unwrap(), file);
    }

    #[test]
    fn test_compact_vector() {
        let file: SkeletonFile = "create -joint a -translate <1,2,3>".parse().unwrap();
        assert_eq!(file.joints[0].translation, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = "create -joint a\nmake -joint b\n".parse::<SkeletonFile>().unwrap_err();
        match err {
            SkeletonFileError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("make"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = "create -joint a -rotate <1, x, 3>".parse::<SkeletonFile>().unwrap_err();
        assert!(matches!(err, SkeletonFileError::Parse { line: 1, .. }));

        let err = "create -rotate <1, 2, 3>".parse::<SkeletonFile>().unwrap_err();
        assert!(err.to_string().contains("missing -joint"));
    }

    #[test]
    fn test_parent_must_come_first() {
        let source = "create -joint knee -parent hip\ncreate -joint hip\n";
        let err = source.parse::<SkeletonFile>().unwrap_err();
        assert!(matches!(
            err,
            SkeletonFileError::UnknownParent { line: 1, ref joint, ref parent } if joint == "knee" && parent == "hip"
        ));
    }

    #[test]
    fn test_duplicate_joint_name() {
        let source = "create -joint hip\ncreate -joint hip\ncreate -joint knee -parent hip\n";
        let err = source.parse::<SkeletonFile>().unwrap_err();
        match err {
            SkeletonFileError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("'hip'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_save_and_load() {
        let file: SkeletonFile = SCRIPT.parse().unwrap();
        let path = std::env::temp_dir().join(format!("rig_skeleton_{}.txt", std::process::id()));

        file.save(&path).unwrap();
        let loaded = SkeletonFile::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, file);
    }
}
