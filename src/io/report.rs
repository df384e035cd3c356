use crate::types::{Artifact, ProductKind, RenderedImage, TerrainError, TerrainResult};

/// Default file name of an assembled report
pub const REPORT_FILE_NAME: &str = "GIS_Report.pdf";

/// Paginates rendered images into one document, one image per page, in
/// the order given. Implementations live outside this crate.
pub trait ReportAssembler {
    fn assemble(&self, pages: &[RenderedImage]) -> TerrainResult<Artifact>;
}

/// Pick the requested products out of `images`, in request order
///
/// A requested product that was never rendered is an error: the report would
/// silently lose a page otherwise.
pub fn select_pages(images: &[RenderedImage], requested: &[ProductKind]) -> TerrainResult<Vec<RenderedImage>> {
    requested
        .iter()
        .map(|product| {
            images
                .iter()
                .find(|img| img.product == *product)
                .cloned()
                .ok_or_else(|| TerrainError::Report(format!("{} was not rendered in this pass", product)))
        })
        .collect()
}

/// Select pages and hand them to the assembler
pub fn assemble_report(
    assembler: &dyn ReportAssembler,
    images: &[RenderedImage],
    requested: &[ProductKind],
) -> TerrainResult<Artifact> {
    let pages = select_pages(images, requested)?;
    if pages.is_empty() {
        return Err(TerrainError::Report("No pages requested".to_string()));
    }

    log::info!("Assembling report with {} pages", pages.len());
    assembler.assemble(&pages).map_err(|e| match e {
        TerrainError::Report(_) => e,
        other => TerrainError::Report(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(product: ProductKind) -> RenderedImage {
        RenderedImage {
            product,
            artifact: Artifact::new(format!("{}.png", product.title()), "image/png", vec![product as u8]),
        }
    }

    struct Concat;

    impl ReportAssembler for Concat {
        fn assemble(&self, pages: &[RenderedImage]) -> TerrainResult<Artifact> {
            let bytes = pages.iter().flat_map(|p| p.artifact.bytes.clone()).collect();
            Ok(Artifact::new(REPORT_FILE_NAME, "application/pdf", bytes))
        }
    }

    struct Broken;

    impl ReportAssembler for Broken {
        fn assemble(&self, _pages: &[RenderedImage]) -> TerrainResult<Artifact> {
            Err(TerrainError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }
    }

    #[test]
    fn test_pages_follow_request_order() {
        let images = vec![
            image(ProductKind::Hillshade),
            image(ProductKind::Slope),
            image(ProductKind::Aspect),
        ];
        let requested = [ProductKind::Aspect, ProductKind::Hillshade];

        let pages = select_pages(&images, &requested).unwrap();
        let order: Vec<_> = pages.iter().map(|p| p.product).collect();
        assert_eq!(order, requested);

        let report = assemble_report(&Concat, &images, &requested).unwrap();
        assert_eq!(report.bytes, vec![ProductKind::Aspect as u8, ProductKind::Hillshade as u8]);
    }

    #[test]
    fn test_missing_product_is_report_error() {
        let images = vec![image(ProductKind::Hillshade)];
        let result = select_pages(&images, &[ProductKind::Slope]);
        assert!(matches!(result, Err(TerrainError::Report(_))));
    }

    #[test]
    fn test_assembler_failures_become_report_errors() {
        let images = vec![image(ProductKind::Hillshade)];
        let result = assemble_report(&Broken, &images, &[ProductKind::Hillshade]);
        assert!(matches!(result, Err(TerrainError::Report(_))));

        let empty = assemble_report(&Concat, &images, &[]);
        assert!(matches!(empty, Err(TerrainError::Report(_))));
    }
}
