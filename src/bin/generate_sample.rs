use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Ontario-style course catalog: each subject carries a few distinct
/// three-letter code prefixes, so generated codes are unique by construction.
const SUBJECTS: &[(&str, &[&str])] = &[
    ("Mathematics", &["MPM", "MCR", "MDM", "MHF"]),
    ("Science", &["SNC", "SBI", "SCH", "SPH"]),
    ("English", &["ENG", "ENL", "ETS"]),
    ("The Arts", &["AVI", "AMU", "ADA"]),
    ("Business Studies", &["BBI", "BAF", "BOH"]),
    ("Canadian and World Studies", &["CGC", "CHC", "CIA"]),
];

const KINDS: &[&str] = &["Core", "Elective", "Open"];
const GRADES: &[(u32, char)] = &[(9, '1'), (10, '2'), (11, '3'), (12, '4')];
const STREAMS: &[char] = &['D', 'C', 'U', 'M'];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let years: Vec<String> = (2011..2022).map(|y| format!("{y}-{}", y + 1)).collect();

    let output_path = "course_data.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header: Vec<String> = ["Course Code", "Subject", "Type", "Grade", "Lessons", "Language", "Provider"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(years.iter().cloned());
    writer.write_record(&header).context("writing header")?;

    let mut n_rows = 0usize;
    for (subject_idx, (subject, prefixes)) in SUBJECTS.iter().enumerate() {
        for (prefix_idx, prefix) in prefixes.iter().enumerate() {
            let (grade, level) = GRADES[(subject_idx + prefix_idx) % GRADES.len()];
            let stream = STREAMS[(rng.next_u64() % STREAMS.len() as u64) as usize];
            let code = format!("{prefix}{level}{stream}");
            let kind = KINDS[(rng.next_u64() % KINDS.len() as u64) as usize];
            let lessons = rng.gauss(20.0, 4.0).round().clamp(8.0, 35.0) as u32;

            // Enrollment history: a per-course base demand with a mild
            // trend, plus year-to-year noise and occasional missing years.
            let base = rng.gauss(600.0, 250.0).max(40.0);
            let trend = rng.gauss(0.0, 0.03);

            let mut record: Vec<String> = vec![
                code,
                subject.to_string(),
                kind.to_string(),
                grade.to_string(),
                lessons.to_string(),
                "English".to_string(),
                "ILC".to_string(),
            ];
            for (year_idx, _) in years.iter().enumerate() {
                if rng.next_f64() < 0.07 {
                    record.push(String::new());
                } else {
                    let drift = 1.0 + trend * year_idx as f64;
                    let value = (base * drift + rng.gauss(0.0, base * 0.05)).max(0.0);
                    record.push((value.round() as u64).to_string());
                }
            }
            writer.write_record(&record).context("writing record")?;
            n_rows += 1;
        }
    }

    writer.flush().context("flushing output")?;
    println!("Wrote {n_rows} courses ({} academic years each) to {output_path}", years.len());
    Ok(())
}
