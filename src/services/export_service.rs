//! CSV / PDF 导出

use chrono::{DateTime, Local, NaiveDate, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::{AppError, AppResult};
use crate::models::{FieldMap, PageConfig, Submission, WinRecord};
use crate::services::{ConfigService, RaffleService, SubmissionService};

/// 表格形式的导出内容，CSV 与 PDF 共用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string()
}

fn field_columns(config: &PageConfig) -> Vec<String> {
    config.fields.iter().map(|f| f.id.clone()).collect()
}

fn row(index: usize, at: &DateTime<Utc>, data: &FieldMap, columns: &[String]) -> Vec<String> {
    let mut cells = vec![(index + 1).to_string(), format_timestamp(at)];
    cells.extend(
        columns
            .iter()
            .map(|c| data.get(c).cloned().unwrap_or_default()),
    );
    cells
}

/// 中奖记录表：`#, Date, <字段>`，使用抽奖时的快照
pub fn wins_report(date: NaiveDate, wins: &[WinRecord], config: &PageConfig) -> Report {
    let columns = field_columns(config);
    let mut headers = vec!["#".to_string(), "Date".to_string()];
    headers.extend(columns.iter().cloned());
    Report {
        title: format!("Sorteados {}", date.format("%d/%m/%Y")),
        headers,
        rows: wins
            .iter()
            .enumerate()
            .map(|(i, w)| row(i, &w.won_at, &w.submission_data, &columns))
            .collect(),
    }
}

/// 报名表：`#, Registered At, <字段>`
pub fn submissions_report(submissions: &[Submission], config: &PageConfig) -> Report {
    let columns = field_columns(config);
    let mut headers = vec!["#".to_string(), "Registered At".to_string()];
    headers.extend(columns.iter().cloned());
    Report {
        title: "Cadastros".to_string(),
        headers,
        rows: submissions
            .iter()
            .enumerate()
            .map(|(i, s)| row(i, &s.created_at, &s.data, &columns))
            .collect(),
    }
}

pub fn to_csv(report: &Report) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&report.headers)?;
    for r in &report.rows {
        writer.write_record(r)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("CSV flush failed: {e}")))
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const LINE_HEIGHT: f32 = 6.0;
const FONT_SIZE: f32 = 8.0;

/// A4 横向表格，超出一页自动分页，每页重复表头
pub fn to_pdf(report: &Report) -> AppResult<Vec<u8>> {
    let pdf_err = |e: printpdf::Error| AppError::InternalError(format!("PDF generation failed: {e}"));

    let (doc, page, layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "table",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let columns = report.headers.len().max(1);
    let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
    // Helvetica 8pt 平均字宽约 1.5mm
    let max_chars = ((col_width / 1.5) as usize).max(3);

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text(report.title.as_str(), 12.0, Mm(MARGIN), Mm(PAGE_HEIGHT - MARGIN), &bold);
    let mut y = PAGE_HEIGHT - MARGIN - 2.0 * LINE_HEIGHT;
    write_row(&current, &report.headers, y, col_width, max_chars, &bold);
    y -= LINE_HEIGHT;

    for r in &report.rows {
        if y < MARGIN {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "table");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT - MARGIN;
            write_row(&current, &report.headers, y, col_width, max_chars, &bold);
            y -= LINE_HEIGHT;
        }
        write_row(&current, r, y, col_width, max_chars, &font);
        y -= LINE_HEIGHT;
    }

    doc.save_to_bytes().map_err(pdf_err)
}

fn write_row(
    layer: &PdfLayerReference,
    cells: &[String],
    y: f32,
    col_width: f32,
    max_chars: usize,
    font: &IndirectFontRef,
) {
    for (i, cell) in cells.iter().enumerate() {
        let text = truncate(cell, max_chars);
        let x = MARGIN + i as f32 * col_width;
        layer.use_text(text, FONT_SIZE, Mm(x), Mm(y), font);
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[derive(Clone)]
pub struct ExportService {
    raffle_service: RaffleService,
    submission_service: SubmissionService,
    config_service: ConfigService,
}

impl ExportService {
    pub fn new(
        raffle_service: RaffleService,
        submission_service: SubmissionService,
        config_service: ConfigService,
    ) -> Self {
        Self {
            raffle_service,
            submission_service,
            config_service,
        }
    }

    pub async fn wins_on(&self, date: NaiveDate) -> AppResult<Report> {
        let config = self.config_service.get().await;
        let wins = self.raffle_service.wins_by_date(date).await?;
        Ok(wins_report(date, &wins, &config))
    }

    pub async fn all_submissions(&self) -> AppResult<Report> {
        let config = self.config_service.get().await;
        let submissions = self.submission_service.load_all().await?;
        Ok(submissions_report(&submissions, &config))
    }
}
