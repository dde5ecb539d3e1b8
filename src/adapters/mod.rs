// Adapters layer: the concrete edges of the system - VCF decoding, the
// explanation HTTP collaborator, and report rendering. Storage and config
// adapters live under src/config, one per entry point.

pub mod explain;
pub mod report;
pub mod vcf;
