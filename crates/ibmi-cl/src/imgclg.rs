use crate::collapse_ws;
use crate::names;

/// `CRTDEVOPT`: create a virtual optical device.
#[derive(Debug, Clone)]
pub struct Crtdevopt {
    device: String,
    text: String,
}

impl Crtdevopt {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            text: "Created by ibmi-ops for network install".to_string(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let device = names::object_name("device", &self.device)?;
        Ok(format!(
            "QSYS/CRTDEVOPT DEVD({device}) RSRCNAME(*VRT) ONLINE(*YES) TEXT('{}')",
            quote_text(&self.text)
        ))
    }
}

/// `CRTIMGCLG`: create an image catalog over an IFS directory.
#[derive(Debug, Clone)]
pub struct Crtimgclg {
    catalog: String,
    directory: String,
    create_directory: bool,
    text: String,
}

impl Crtimgclg {
    pub fn new(catalog: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            directory: directory.into(),
            create_directory: true,
            text: "Created by ibmi-ops".to_string(),
        }
    }

    pub fn create_directory(mut self, create_directory: bool) -> Self {
        self.create_directory = create_directory;
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let catalog = names::object_name("image catalog", &self.catalog)?;
        if self.directory.trim().is_empty() {
            anyhow::bail!("image catalog directory cannot be empty");
        }
        Ok(format!(
            "QSYS/CRTIMGCLG IMGCLG({catalog}) DIR('{directory}') CRTDIR({crtdir}) TEXT('{text}')",
            directory = quote_text(self.directory.trim()),
            crtdir = if self.create_directory { "*YES" } else { "*NO" },
            text = quote_text(&self.text),
        ))
    }
}

/// `VRYCFG`: vary a configuration object on or off.
#[derive(Debug, Clone)]
pub struct Vrycfg {
    devices: Vec<String>,
    on: bool,
    forced: bool,
    extra_parameters: String,
}

impl Vrycfg {
    pub fn on(devices: Vec<String>) -> Self {
        Self {
            devices,
            on: true,
            forced: false,
            extra_parameters: String::new(),
        }
    }

    pub fn off(devices: Vec<String>) -> Self {
        Self {
            devices,
            on: false,
            forced: false,
            extra_parameters: String::new(),
        }
    }

    pub fn forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn extra_parameters(mut self, extra_parameters: impl Into<String>) -> Self {
        self.extra_parameters = extra_parameters.into();
        self
    }

    pub fn render(&self) -> anyhow::Result<String> {
        if self.devices.is_empty() {
            anyhow::bail!("VRYCFG requires at least one configuration object");
        }
        let mut rendered = Vec::with_capacity(self.devices.len());
        for device in &self.devices {
            rendered.push(names::object_name("device", device)?);
        }
        let status = if self.on { "*ON" } else { "*OFF" };
        let force = if self.forced { "FRCVRYOFF(*YES)" } else { "" };
        Ok(collapse_ws(&format!(
            "QSYS/VRYCFG CFGOBJ({devices}) CFGTYPE(*DEV) STATUS({status}) {force} {extra}",
            devices = rendered.join(" "),
            extra = self.extra_parameters,
        )))
    }
}

/// `LODIMGCLG`: load or unload an image catalog on a virtual device.
#[derive(Debug, Clone)]
pub struct Lodimgclg {
    catalog: String,
    device: Option<String>,
    load: bool,
}

impl Lodimgclg {
    pub fn load(catalog: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            device: Some(device.into()),
            load: true,
        }
    }

    pub fn unload(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            device: None,
            load: false,
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let catalog = names::object_name("image catalog", &self.catalog)?;
        if self.load {
            let device = match &self.device {
                Some(device) => names::object_name("device", device)?,
                None => anyhow::bail!("LODIMGCLG *LOAD requires a device"),
            };
            Ok(format!(
                "QSYS/LODIMGCLG IMGCLG({catalog}) DEV({device}) OPTION(*LOAD)"
            ))
        } else {
            Ok(format!("QSYS/LODIMGCLG IMGCLG({catalog}) OPTION(*UNLOAD)"))
        }
    }
}

/// `DLTIMGCLG`: delete an image catalog, keeping or removing the images.
#[derive(Debug, Clone)]
pub struct Dltimgclg {
    catalog: String,
    keep_images: bool,
}

impl Dltimgclg {
    pub fn new(catalog: impl Into<String>, keep_images: bool) -> Self {
        Self {
            catalog: catalog.into(),
            keep_images,
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let catalog = names::object_name("image catalog", &self.catalog)?;
        let keep = if self.keep_images { "*YES" } else { "*NO" };
        Ok(format!("QSYS/DLTIMGCLG IMGCLG({catalog}) KEEP({keep})"))
    }
}

/// `DLTDEVD`: delete a device description.
#[derive(Debug, Clone)]
pub struct Dltdevd {
    device: String,
}

impl Dltdevd {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let device = names::object_name("device", &self.device)?;
        Ok(format!("QSYS/DLTDEVD DEVD({device})"))
    }
}

/// `STRNFSSVR *ALL`: start every NFS server daemon.
#[derive(Debug, Clone)]
pub struct Strnfssvr;

impl Strnfssvr {
    pub fn render(&self) -> String {
        "QSYS/STRNFSSVR *ALL".to_string()
    }
}

/// `CHGNFSEXP`: export a directory read-only over NFS.
#[derive(Debug, Clone)]
pub struct Chgnfsexp {
    directory: String,
}

impl Chgnfsexp {
    pub fn export_read_only(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn render(&self) -> anyhow::Result<String> {
        if self.directory.trim().is_empty() {
            anyhow::bail!("NFS export directory cannot be empty");
        }
        Ok(format!(
            "QSYS/CHGNFSEXP OPTIONS('-i -o ro') DIR('{}')",
            quote_text(self.directory.trim())
        ))
    }
}

// CL quotes inside quoted strings double up.
fn quote_text(raw: &str) -> String {
    raw.replace('\'', "''")
}
