use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::report::ClusterReport;

/// Write one `{i+1}_{stem}.txt` file per cluster listing its members,
/// one `label<TAB>label` line each. Returns the written paths in cluster order.
pub fn write_memberships<P: AsRef<Path>>(
    report: &ClusterReport,
    dir: P,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let mut paths = Vec::with_capacity(report.len());
    for cluster in &report.clusters {
        let path = dir.join(format!("{}_{}.txt", cluster.index + 1, stem));
        let file =
            File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut out = BufWriter::new(file);
        for identity in &cluster.members {
            writeln!(out, "{}", identity)?;
        }
        out.flush()
            .with_context(|| format!("Failed to write {:?}", path))?;

        if cluster.members.is_empty() {
            warn!("cluster {} is empty; wrote {:?} anyway", cluster.index + 1, path);
        }
        paths.push(path);
    }
    info!("Wrote {} membership files to {:?}", paths.len(), dir);
    Ok(paths)
}

/// Write the de-normalized prototypes as a delimited table, one row per cluster.
pub fn write_prototypes<P: AsRef<Path>>(
    report: &ClusterReport,
    path: P,
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    let mut header = vec!["cluster".to_string()];
    header.extend(report.feature_names.iter().cloned());
    wtr.write_record(&header)?;

    for cluster in &report.clusters {
        let mut row = vec![(cluster.index + 1).to_string()];
        row.extend(cluster.prototype.iter().map(|x| x.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {} prototypes to {:?}", report.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Identity;
    use crate::report::ClusterSummary;
    use ndarray::array;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("player_som_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn report() -> ClusterReport {
        ClusterReport {
            feature_names: vec!["G".into(), "A".into()],
            clusters: vec![
                ClusterSummary {
                    index: 0,
                    members: vec![
                        Identity::new("Connor McDavid", "EDM"),
                        Identity::new("Leon Draisaitl", "EDM"),
                    ],
                    prototype: array![40.5, 60.0],
                },
                ClusterSummary {
                    index: 1,
                    members: vec![],
                    prototype: array![2.0, 3.25],
                },
            ],
        }
    }

    #[test]
    fn test_write_memberships() {
        let dir = scratch_dir("members");
        let paths = write_memberships(&report(), &dir, "NHL").unwrap();
        assert_eq!(paths, vec![dir.join("1_NHL.txt"), dir.join("2_NHL.txt")]);
        assert_eq!(
            fs::read_to_string(&paths[0]).unwrap(),
            "Connor McDavid\tEDM\nLeon Draisaitl\tEDM\n"
        );
        assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_prototypes() {
        let dir = scratch_dir("protos");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("prototypes.tsv");
        write_prototypes(&report(), &path, b'\t').unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "cluster\tG\tA\n1\t40.5\t60\n2\t2\t3.25\n"
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
