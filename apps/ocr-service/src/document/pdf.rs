//! First-page PDF rendering using MuPDF

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix};

use super::error::{DocumentError, DocumentResult};

/// PDF user space is 72 units per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Render page 1 of a PDF to an RGB bitmap at `dpi`
pub fn render_first_page(data: &[u8], dpi: f32) -> DocumentResult<RgbImage> {
    let doc = Document::from_bytes(data, "application/pdf")?;
    let page_count = doc.page_count()?;
    if page_count < 1 {
        return Err(DocumentError::EmptyPdf);
    }

    let page = doc.load_page(0)?;

    // Clamp to keep a hostile DPI setting from exhausting memory
    let scale = (dpi / POINTS_PER_INCH).clamp(0.25, 6.0);
    let matrix = Matrix::new_scale(scale, scale);

    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    pixmap_to_rgb(&pixmap)
}

fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> DocumentResult<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    if width == 0 || height == 0 || n < 3 {
        return Err(DocumentError::Decode(format!(
            "PDF rendered to an unusable pixmap ({}x{}, {} components)",
            width, height, n
        )));
    }

    // Rows may be padded beyond width * n
    let stride = samples.len() / height as usize;
    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = y * stride + x * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| DocumentError::Decode("Failed to create image buffer".to_string()))
}

/// Build a small PDF whose pages are US Letter (612x792pt) with a black
/// 200pt square drawn at (100, 100) from the bottom-left corner
#[cfg(test)]
pub(crate) fn letter_pdf(pages: usize) -> Vec<u8> {
    let content = "0 0 0 rg 100 100 200 200 re f";
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", 4 + i)).collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
    ];
    for _ in 0..pages {
        objects.push(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 3 0 R /Resources << >> >>"
                .to_string(),
        );
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}
