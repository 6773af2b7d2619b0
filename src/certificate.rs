use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Pt, Rect,
    Rgb,
};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

const FRAME_WIDTH: f32 = 560.0;
const FRAME_HEIGHT: f32 = 740.0;
const FRAME_COLOR: (f32, f32, f32) = (255.0, 227.0, 172.0);

const TITLE: &str = "Certificado de Conclusão";
const TITLE_SIZE: f32 = 24.0;
const TITLE_OFFSET: f32 = 100.0;

const BODY_SIZE: f32 = 14.0;
const BODY_OFFSET: f32 = 200.0;
const BODY_LEADING: f32 = 20.0;
const BODY_COLUMNS: usize = 60;

const SIGNATURE_LINE_Y: f32 = 200.0;
const SIGNATURE_LABEL_Y: f32 = 180.0;
const SIGNATURE_WIDTH: f32 = 200.0;
const SIGNATURE_LABEL: &str = "Responsável pelo Curso";
const SIGNATURE_SIZE: f32 = 12.0;

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to render certificate: {0}")]
    Render(String),
}

pub type CertificateResult<T> = Result<T, CertificateError>;

fn render_err(e: printpdf::Error) -> CertificateError {
    CertificateError::Render(format!("{e:?}"))
}

fn pt(x: f32, y: f32) -> (Mm, Mm) {
    (Mm::from(Pt(x)), Mm::from(Pt(y)))
}

/// Advance widths in 1/1000 em for ASCII 32..=126, from the Adobe core font metrics.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Used for glyphs outside the tables.
const FALLBACK_WIDTH: u16 = 556;
/// Accented `i` is drawn on the dotless glyph, which is wider than `i`.
const DOTLESS_I_WIDTH: u16 = 278;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular => &HELVETICA_WIDTHS,
            Self::Bold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    fn glyph_width(self, c: char) -> u16 {
        let base = match c {
            'í' | 'ì' | 'î' | 'ï' => return DOTLESS_I_WIDTH,
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ý' | 'ÿ' => 'y',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ç' => 'C',
            'Ñ' => 'N',
            'Ý' => 'Y',
            other => other,
        };
        (base as usize)
            .checked_sub(32)
            .and_then(|idx| self.widths().get(idx))
            .copied()
            .unwrap_or(FALLBACK_WIDTH)
    }

    /// Width in points of `text` set at `size`.
    fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        units as f32 * size / 1000.0
    }
}

/// Horizontal start that centres `text` on the page.
fn centered_x(text: &str, size: f32, face: Face) -> f32 {
    ((PAGE_WIDTH - face.text_width(text, size)) / 2.0).max(0.0)
}

fn centered_text(
    layer: &PdfLayerReference,
    text: &str,
    size: f32,
    y: f32,
    (font, face): (&IndirectFontRef, Face),
) {
    let (x, y) = pt(centered_x(text, size, face), y);
    layer.use_text(text, size, x, y, font);
}

pub fn certificate_body(user_name: &str, course_name: &str, hours: i64, extra: &str) -> String {
    let mut body = format!(
        "Certificamos que {user_name} concluiu com sucesso o curso '{course_name}' com carga horária de {hours} horas."
    );
    let extra = extra.trim();
    if !extra.is_empty() {
        body.push(' ');
        body.push_str(extra);
    }
    body
}

/// Renders a one-page completion certificate and returns the PDF bytes.
#[tracing::instrument(skip(certificate_text))]
pub fn render_certificate(
    user_name: &str,
    course_name: &str,
    hours: i64,
    certificate_text: &str,
) -> CertificateResult<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Certificado - {course_name}"),
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "certificate".to_string(),
    );
    let layer = doc.get_page(page).get_layer(layer);

    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;

    let (r, g, b) = FRAME_COLOR;
    layer.set_fill_color(Color::Rgb(Rgb::new(r / 255.0, g / 255.0, b / 255.0, None)));
    let left = (PAGE_WIDTH - FRAME_WIDTH) / 2.0;
    let bottom = (PAGE_HEIGHT - FRAME_HEIGHT) / 2.0;
    let (llx, lly) = pt(left, bottom);
    let (urx, ury) = pt(left + FRAME_WIDTH, bottom + FRAME_HEIGHT);
    layer.add_rect(Rect::new(llx, lly, urx, ury));

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    centered_text(
        &layer,
        TITLE,
        TITLE_SIZE,
        PAGE_HEIGHT - TITLE_OFFSET,
        (&bold, Face::Bold),
    );

    let body = certificate_body(user_name, course_name, hours, certificate_text);
    let mut y = PAGE_HEIGHT - BODY_OFFSET;
    for line in textwrap::wrap(&body, BODY_COLUMNS) {
        centered_text(&layer, &line, BODY_SIZE, y, (&regular, Face::Regular));
        y -= BODY_LEADING;
    }

    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(1.0);
    let start = (PAGE_WIDTH - SIGNATURE_WIDTH) / 2.0;
    let (x1, y1) = pt(start, SIGNATURE_LINE_Y);
    let (x2, y2) = pt(start + SIGNATURE_WIDTH, SIGNATURE_LINE_Y);
    layer.add_line(Line {
        points: vec![(Point::new(x1, y1), false), (Point::new(x2, y2), false)],
        is_closed: false,
    });
    centered_text(
        &layer,
        SIGNATURE_LABEL,
        SIGNATURE_SIZE,
        SIGNATURE_LABEL_Y,
        (&regular, Face::Regular),
    );

    doc.save_to_bytes().map_err(render_err)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_pdf_bytes() {
        let bytes = render_certificate("Maria Silva", "Rust Básico", 40, "").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_names_still_render() {
        let name = "Fulano de Tal ".repeat(20);
        let bytes = render_certificate(&name, "Curso", 1, "Texto adicional do curso.").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn body_mentions_course_and_hours() {
        let body = certificate_body("Ana", "Python", 12, "");
        assert_eq!(
            body,
            "Certificamos que Ana concluiu com sucesso o curso 'Python' com carga horária de 12 horas."
        );
        let body = certificate_body("Ana", "Python", 12, "  Parabéns!  ");
        assert!(body.ends_with("horas. Parabéns!"));
    }

    #[test]
    fn centring_never_goes_negative() {
        assert_eq!(centered_x(&"x".repeat(500), 24.0, Face::Regular), 0.0);
        assert!(centered_x("abc", 10.0, Face::Regular) > 0.0);
    }

    #[test]
    fn widths_follow_font_metrics() {
        assert!((Face::Regular.text_width("AV", 10.0) - 13.34).abs() < 1e-3);
        assert!((Face::Bold.text_width("Rust", 10.0) - 22.22).abs() < 1e-3);
        assert_eq!(Face::Regular.glyph_width('ç'), Face::Regular.glyph_width('c'));
        assert_eq!(Face::Bold.glyph_width('Ã'), Face::Bold.glyph_width('A'));
        assert_eq!(Face::Regular.glyph_width('í'), 278);
        assert_eq!(Face::Regular.glyph_width('€'), FALLBACK_WIDTH);
    }

    #[test]
    fn centred_lines_are_symmetric() {
        for (text, face) in [
            (TITLE, Face::Bold),
            (SIGNATURE_LABEL, Face::Regular),
            ("WWWWWWWWWWWWWWWWWWWW", Face::Regular),
            ("iiiiiiiiiiiiiiiiiiii", Face::Regular),
        ] {
            let x = centered_x(text, 14.0, face);
            let right = PAGE_WIDTH - (x + face.text_width(text, 14.0));
            assert!((x - right).abs() < 1e-3, "{text} is off-centre");
        }
        // same glyph count, very different widths
        assert!(centered_x("iiii", 14.0, Face::Regular) > centered_x("WWWW", 14.0, Face::Regular));
    }
}
