//! Пример: чтение файла захвата FSVR через CaptureFile
//!
//! Демонстрирует:
//! - открытие файла и разбор заголовка
//! - итерацию кадров с остановкой на первой ошибке
//! - перемотку и повторное чтение

use sweepstat_core::CaptureFile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "252MKS_001.DAT".to_string());

    let mut capture = match CaptureFile::open(&input_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Header read failed: {e}");
            return Err(Box::new(e));
        }
    };

    let h = capture.header()?;
    println!("✓ Header read");
    println!("  Frames     : {}", h.frames);
    println!("  Values     : {}", h.values);
    println!("  Sweep time : {} s", h.sweep_time);
    println!("  Units      : {} / {}", h.x_unit, h.y_unit);
    if let Some(center) = h.field("Center Freq") {
        println!("  Center     : {}", center.join(" "));
    }

    // --- Первые 3 кадра ---
    println!("\nFirst frames:");
    for frame in capture.by_ref().take(3) {
        let frame = frame?;
        let peak = frame.peak().map(|p| format!("{} @ {}", p.level, p.frequency));
        println!(
            "  #{} {} {}  mean={:?} peak={}",
            frame.index,
            frame.date,
            frame.time,
            frame.mean_level(),
            peak.unwrap_or_default()
        );
    }

    // --- Перемотка и последний кадр ---
    let last = capture.frame_count()?.saturating_sub(1);
    let frame = capture.seek_frame(last)?;
    println!("\n✓ Last frame #{} at {}", frame.index, frame.timestamp);

    Ok(())
}
