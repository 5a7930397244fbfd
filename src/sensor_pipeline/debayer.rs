//! Demosaicing of RAW captures into the linear RGB guidance image

mod cpu_debayer;

pub use cpu_debayer::CpuDebayer;
