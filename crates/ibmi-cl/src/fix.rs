use crate::collapse_ws;

/// `SNDPTFORD`: order a PTF or PTF group from the service provider.
/// Rendered without the `QSYS/` prefix because it is always wrapped in
/// an SBMJOB by the caller.
#[derive(Debug, Clone)]
pub struct Sndptford {
    ptf_id: String,
    product: String,
    release: String,
    delivery_format: String,
    order: String,
    reorder: bool,
    check_ptf: bool,
    image_directory: String,
    parameters: String,
}

impl Sndptford {
    pub fn new(ptf_id: impl Into<String>) -> Self {
        Self {
            ptf_id: ptf_id.into(),
            product: "*ONLYPRD".to_string(),
            release: "*ONLYRLS".to_string(),
            delivery_format: "*SAVF".to_string(),
            order: "*REQUIRED".to_string(),
            reorder: true,
            check_ptf: false,
            image_directory: "*DFT".to_string(),
            parameters: String::new(),
        }
    }

    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn delivery_format(mut self, delivery_format: impl Into<String>) -> Self {
        self.delivery_format = delivery_format.into();
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn reorder(mut self, reorder: bool) -> Self {
        self.reorder = reorder;
        self
    }

    pub fn check_ptf(mut self, check_ptf: bool) -> Self {
        self.check_ptf = check_ptf;
        self
    }

    pub fn image_directory(mut self, image_directory: impl Into<String>) -> Self {
        self.image_directory = image_directory.into();
        self
    }

    pub fn parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let ptf_id = self.ptf_id.trim();
        if ptf_id.is_empty() {
            anyhow::bail!("SNDPTFORD requires a PTF identifier");
        }
        if !matches!(self.order.as_str(), "*REQUIRED" | "*PTFID") {
            anyhow::bail!("ORDER must be *REQUIRED or *PTFID, got {}", self.order);
        }
        // *DFT stays bare; a real path is single-quoted.
        let image_directory = if self.image_directory == "*DFT" {
            self.image_directory.clone()
        } else {
            format!("'{}'", self.image_directory)
        };
        Ok(collapse_ws(&format!(
            "SNDPTFORD PTFID(({ptf_id} {product} {release})) DLVRYFMT({format}) ORDER({order}) \
             REORDER({reorder}) CHKPTF({check}) IMGDIR({image_directory}) {parameters}",
            product = self.product,
            release = self.release,
            format = self.delivery_format,
            order = self.order,
            reorder = if self.reorder { "*YES" } else { "*NO" },
            check = if self.check_ptf { "*YES" } else { "*NO" },
            parameters = self.parameters,
        )))
    }
}
