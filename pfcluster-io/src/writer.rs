//! Cluster output writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pfcluster_algorithms::EventClusters;
use pfcluster_core::{CellFraction, Cluster, ClusterType, Layer, Point3, Subsystem};
use serde::Serialize;

use crate::Result;

/// CSV column names, in row order.
pub const CSV_HEADER: &str =
    "event,subsystem,id,type,layer,energy,eta,phi,x,y,z,depth_x,depth_y,depth_z,n_cells";

/// One cluster as written to JSON lines.
#[derive(Serialize)]
struct ClusterLine<'a> {
    event: u64,
    subsystem: Subsystem,
    id: usize,
    cluster_type: ClusterType,
    layer: Layer,
    energy: f64,
    eta: f64,
    phi: f64,
    position: Point3,
    depth_corrected: Point3,
    cells: &'a [CellFraction],
}

/// Writes event clusters as CSV rows or JSON lines.
///
/// Clusters are written subsystem by subsystem (ECAL, HCAL, PS) in id order.
pub struct ClusterWriter<W: Write = BufWriter<File>> {
    writer: W,
    header_written: bool,
}

impl ClusterWriter<BufWriter<File>> {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ClusterWriter<W> {
    /// Wraps any writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// Writes one CSV row per cluster. The header goes out before the first row.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_event_csv(&mut self, event: u64, clusters: &EventClusters) -> Result<usize> {
        if !self.header_written {
            writeln!(self.writer, "{CSV_HEADER}")?;
            self.header_written = true;
        }

        let mut rows = 0;
        for subsystem in Subsystem::ALL {
            for c in clusters.collection(subsystem) {
                writeln!(
                    self.writer,
                    "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    event,
                    subsystem,
                    c.id,
                    c.cluster_type,
                    c.layer.code(),
                    c.energy,
                    c.eta_phi.eta,
                    c.eta_phi.phi,
                    c.position.x,
                    c.position.y,
                    c.position.z,
                    c.depth_corrected.x,
                    c.depth_corrected.y,
                    c.depth_corrected.z,
                    c.len()
                )?;
                rows += 1;
            }
        }
        Ok(rows)
    }

    /// Writes one JSON object per cluster, including its cell fractions.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn write_event_json(&mut self, event: u64, clusters: &EventClusters) -> Result<usize> {
        let mut lines = 0;
        for subsystem in Subsystem::ALL {
            for c in clusters.collection(subsystem) {
                serde_json::to_writer(&mut self.writer, &line(event, subsystem, c))?;
                self.writer.write_all(b"\n")?;
                lines += 1;
            }
        }
        Ok(lines)
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn line(event: u64, subsystem: Subsystem, c: &Cluster) -> ClusterLine<'_> {
    ClusterLine {
        event,
        subsystem,
        id: c.id,
        cluster_type: c.cluster_type,
        layer: c.layer,
        energy: c.energy,
        eta: c.eta_phi.eta,
        phi: c.eta_phi.phi,
        position: c.position,
        depth_corrected: c.depth_corrected,
        cells: &c.fractions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfcluster_core::{ClusterCollection, EtaPhi};
    use tempfile::NamedTempFile;

    fn clusters() -> EventClusters {
        let mut ecal = Cluster::new(
            0,
            ClusterType::Shared,
            Layer::EcalBarrel,
            1,
            vec![CellFraction::new(1, 1.0), CellFraction::new(2, 0.5)],
        );
        ecal.energy = 2.5;
        ecal.position = Point3::new(129.0, 0.0, 10.0);
        ecal.eta_phi = EtaPhi::new(0.25, 0.0);
        ecal.depth_corrected = ecal.position;

        let mut hcal = Cluster::new(
            0,
            ClusterType::Topological,
            Layer::HcalBarrel1,
            0,
            vec![CellFraction::new(0, 1.0)],
        );
        hcal.energy = 4.0;

        let mut event = EventClusters::empty();
        event.ecal = ClusterCollection::new(Subsystem::Ecal, vec![ecal], vec![false, true, false]);
        event.hcal = ClusterCollection::new(Subsystem::Hcal, vec![hcal], vec![true]);
        event
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = ClusterWriter::create(file.path()).unwrap();

        assert_eq!(writer.write_event_csv(7, &clusters()).unwrap(), 2);
        assert_eq!(writer.write_event_csv(8, &EventClusters::empty()).unwrap(), 0);
        writer.flush().unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("7,ECAL,0,shared,-1,2.5,0.25,0,129,0,10,"));
        assert!(lines[1].ends_with(",2"));
        assert!(lines[2].starts_with("7,HCAL,0,topo,1,4,"));
    }

    #[test]
    fn test_write_json_lines() {
        let mut writer = ClusterWriter::new(Vec::new());
        assert_eq!(writer.write_event_json(3, &clusters()).unwrap(), 2);

        let bytes = writer.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["event"], 3);
        assert_eq!(first["subsystem"], "Ecal");
        assert_eq!(first["layer"], -1);
        assert_eq!(first["cells"].as_array().unwrap().len(), 2);
        assert_eq!(first["cells"][1]["fraction"], 0.5);
    }
}
