//! Engine configuration: the `.info` keyword-value file realized as a
//! Rust value type, threaded explicitly through every call instead of the
//! original's module-level statics (per the redesign note on global state).

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// `opt_mode`: negative or zero selects the hexahedral path, positive the
/// tetrahedral path (spec §4.3, §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptMode {
    Hex(i32),
    Tet(i32),
}

impl OptMode {
    pub fn from_raw(raw: i32) -> Result<Self, Error> {
        match raw {
            -2..=0 => Ok(OptMode::Hex(raw)),
            1..=4 => Ok(OptMode::Tet(raw)),
            _ => Err(Error::ConfigError {
                component: "Config",
                what: format!("opt_mode {} out of range [-2,4]", raw),
            }),
        }
    }

    pub fn is_hex(&self) -> bool {
        matches!(self, OptMode::Hex(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelSetType {
    Cube,
    Sphere,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HmodeLag {
    Iso,
    Met,
    Ls,
}

/// The computational box: [x_min,x_max] x [y_min,y_max] x [z_min,z_max]
/// sampled at n_x by n_y by n_z vertices.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BoxSpec {
    pub x_min: f64,
    pub y_min: f64,
    pub z_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_max: f64,
    pub n_x: usize,
    pub n_y: usize,
    pub n_z: usize,
}

impl BoxSpec {
    pub fn delta(&self) -> (f64, f64, f64) {
        (
            (self.x_max - self.x_min) / (self.n_x - 1) as f64,
            (self.y_max - self.y_min) / (self.n_y - 1) as f64,
            (self.z_max - self.z_min) / (self.n_z - 1) as f64,
        )
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.x_min < self.x_max && self.y_min < self.y_max && self.z_min < self.z_max) {
            return Err(Error::ConfigError {
                component: "BoxSpec",
                what: "box bounds must satisfy min < max on every axis".into(),
            });
        }
        if self.n_x < 3 || self.n_y < 3 || self.n_z < 3 {
            return Err(Error::ConfigError {
                component: "BoxSpec",
                what: format!(
                    "n_x,n_y,n_z must all be >= 3 (got {},{},{})",
                    self.n_x, self.n_y, self.n_z
                ),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LevelSetSpec {
    pub ls_type: LevelSetType,
    pub ls_x: f64,
    pub ls_y: f64,
    pub ls_z: f64,
    pub ls_r: f64,
}

impl LevelSetSpec {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.ls_r > 0.0) {
            return Err(Error::ConfigError {
                component: "LevelSetSpec",
                what: format!("ls_r must be > 0 (got {})", self.ls_r),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MetricSpec {
    pub met_err: f64,
    pub met_min: f64,
    pub met_max: f64,
}

/// 9/32 = [d/(d+1)]^2 / 2 for d = 3, fixed by the specification.
pub const MET_CST: f64 = 9.0 / 32.0;

impl MetricSpec {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.met_err > 0.0 && self.met_min > 0.0 && self.met_max > self.met_min) {
            return Err(Error::ConfigError {
                component: "MetricSpec",
                what: "require met_err > 0, met_min > 0, met_max > met_min".into(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RemeshSizeSpec {
    pub hmin_iso: f64,
    pub hmax_iso: f64,
    pub hmin_met: f64,
    pub hmax_met: f64,
    pub hmin_ls: f64,
    pub hmax_ls: f64,
    pub hmin_lag: f64,
    pub hmax_lag: f64,
    pub hausd_iso: f64,
    pub hausd_met: f64,
    pub hausd_ls: f64,
    pub hausd_lag: f64,
    pub hgrad_iso: f64,
    pub hgrad_met: f64,
    pub hgrad_ls: f64,
    pub hgrad_lag: f64,
    pub hmode_lag: HmodeLag,
}

impl RemeshSizeSpec {
    pub fn validate(&self) -> Result<(), Error> {
        let pairs = [
            ("iso", self.hmin_iso, self.hmax_iso, self.hausd_iso, self.hgrad_iso),
            ("met", self.hmin_met, self.hmax_met, self.hausd_met, self.hgrad_met),
            ("ls", self.hmin_ls, self.hmax_ls, self.hausd_ls, self.hgrad_ls),
            ("lag", self.hmin_lag, self.hmax_lag, self.hausd_lag, self.hgrad_lag),
        ];
        for (name, hmin, hmax, hausd, hgrad) in pairs {
            if !(hmin > 0.0 && hmax > 0.0 && hausd > 0.0 && hgrad > 0.0 && hmin <= hmax) {
                return Err(Error::ConfigError {
                    component: "RemeshSizeSpec",
                    what: format!("remesh size parameters for '{}' must be positive with hmin <= hmax", name),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AdvectionSpec {
    pub n_iter: usize,
    pub residual: f64,
    pub delta_t: f64,
    pub no_cfl: bool,
}

impl AdvectionSpec {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.residual > 0.0 && self.delta_t > 0.0) {
            return Err(Error::ConfigError {
                component: "AdvectionSpec",
                what: "require residual > 0 and delta_t > 0".into(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OptimizationSpec {
    pub iter_max: usize,
    pub iter_told0p: f64,
    pub iter_told1p: f64,
    pub iter_told2p: f64,
    pub nu_electrons: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveSpec {
    pub save_type: u8,
    pub save_mesh: String,
    pub save_data: String,
    pub save_print: u32,
    pub save_where: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolPaths {
    pub path_medit: String,
    pub path_mmg3d: String,
    pub path_mshdist: String,
    pub path_elastic: String,
    pub path_advect: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub opt_mode: OptMode,
    pub verbose: u8,
    pub n_cpu: usize,
    pub name_length: usize,
    pub path_length: usize,
    pub box_spec: BoxSpec,
    pub level_set: LevelSetSpec,
    pub metric: MetricSpec,
    pub trick_matrix: bool,
    pub approx_mode: bool,
    pub orb_rhf: bool,
    pub optimization: OptimizationSpec,
    pub remesh: RemeshSizeSpec,
    pub advection: AdvectionSpec,
    pub save: SaveSpec,
    pub tools: ToolPaths,
}

impl Config {
    /// Validates every cross-field invariant named in the specification.
    pub fn validate(&self, nmorb: usize) -> Result<(), Error> {
        if !(self.n_cpu >= 1) {
            return Err(Error::ConfigError {
                component: "Config",
                what: "n_cpu must be >= 1".into(),
            });
        }
        if !(7..=501).contains(&self.name_length) {
            return Err(Error::ConfigError {
                component: "Config",
                what: format!("name_length must be in [7,501] (got {})", self.name_length),
            });
        }
        if self.verbose > 2 {
            return Err(Error::ConfigError {
                component: "Config",
                what: "verbose must be 0, 1 or 2".into(),
            });
        }
        self.box_spec.validate()?;
        self.level_set.validate()?;
        self.metric.validate()?;
        self.remesh.validate()?;
        self.advection.validate()?;
        if !(1..=nmorb.max(1)).contains(&self.optimization.nu_electrons) {
            return Err(Error::ConfigError {
                component: "Config",
                what: format!(
                    "nu_electrons must be in [1,{}] (got {})",
                    nmorb, self.optimization.nu_electrons
                ),
            });
        }
        if self.save.save_type > 3 {
            return Err(Error::ConfigError {
                component: "Config",
                what: "save_type must be in 0..=3".into(),
            });
        }
        if self.save.save_where > 8 {
            return Err(Error::ConfigError {
                component: "Config",
                what: "save_where must be in 0..=8".into(),
            });
        }
        for path in [
            &self.tools.path_medit,
            &self.tools.path_mmg3d,
            &self.tools.path_mshdist,
            &self.tools.path_elastic,
            &self.tools.path_advect,
        ] {
            if path.len() >= self.path_length {
                return Err(Error::ConfigError {
                    component: "Config",
                    what: format!("tool path '{}' exceeds path_length {}", path, self.path_length),
                });
            }
        }
        Ok(())
    }

    /// Parses a keyword-value `.info` file, hand-scanned line by line in the
    /// teacher's `parser_xyz.rs` style rather than via a generic parser
    /// combinator crate.
    pub fn from_info_str(text: &str) -> Result<Self, Error> {
        let mut kv = std::collections::HashMap::new();
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let key = parts.next().ok_or_else(|| Error::ConfigError {
                component: "Config",
                what: format!("malformed line {}", lineno + 1),
            })?;
            let value: Vec<&str> = parts.collect();
            kv.insert(key.to_string(), value.join(" "));
        }

        let get = |k: &str| -> Result<String, Error> {
            kv.get(k).cloned().ok_or_else(|| Error::ConfigError {
                component: "Config",
                what: format!("missing required key '{}'", k),
            })
        };
        let get_f64 = |k: &str| -> Result<f64, Error> {
            get(k)?.parse::<f64>().map_err(|_| Error::ConfigError {
                component: "Config",
                what: format!("key '{}' is not a float", k),
            })
        };
        let get_usize = |k: &str| -> Result<usize, Error> {
            get(k)?.parse::<usize>().map_err(|_| Error::ConfigError {
                component: "Config",
                what: format!("key '{}' is not an unsigned integer", k),
            })
        };
        let get_i32 = |k: &str| -> Result<i32, Error> {
            get(k)?.parse::<i32>().map_err(|_| Error::ConfigError {
                component: "Config",
                what: format!("key '{}' is not an integer", k),
            })
        };
        let get_bool01 = |k: &str| -> Result<bool, Error> {
            match get_i32(k)? {
                0 => Ok(false),
                1 => Ok(true),
                v => Err(Error::ConfigError {
                    component: "Config",
                    what: format!("key '{}' must be 0 or 1 (got {})", k, v),
                }),
            }
        };

        let opt_mode = OptMode::from_raw(get_i32("opt_mode")?)?;
        let ls_type = match get_i32("ls_type")? {
            0 => LevelSetType::Cube,
            1 => LevelSetType::Sphere,
            v => {
                return Err(Error::ConfigError {
                    component: "Config",
                    what: format!("ls_type must be 0 or 1 (got {})", v),
                })
            }
        };
        let hmode_lag = match get_i32("hmode_lag")? {
            0 => HmodeLag::Iso,
            1 => HmodeLag::Met,
            2 => HmodeLag::Ls,
            v => {
                return Err(Error::ConfigError {
                    component: "Config",
                    what: format!("hmode_lag must be 0, 1 or 2 (got {})", v),
                })
            }
        };

        Ok(Config {
            opt_mode,
            verbose: get_usize("verbose")? as u8,
            n_cpu: get_usize("n_cpu")?,
            name_length: get_usize("name_length")?,
            path_length: get_usize("path_length").unwrap_or(256),
            box_spec: BoxSpec {
                x_min: get_f64("x_min")?,
                y_min: get_f64("y_min")?,
                z_min: get_f64("z_min")?,
                x_max: get_f64("x_max")?,
                y_max: get_f64("y_max")?,
                z_max: get_f64("z_max")?,
                n_x: get_usize("n_x")?,
                n_y: get_usize("n_y")?,
                n_z: get_usize("n_z")?,
            },
            level_set: LevelSetSpec {
                ls_type,
                ls_x: get_f64("ls_x")?,
                ls_y: get_f64("ls_y")?,
                ls_z: get_f64("ls_z")?,
                ls_r: get_f64("ls_r")?,
            },
            metric: MetricSpec {
                met_err: get_f64("met_err")?,
                met_min: get_f64("met_min")?,
                met_max: get_f64("met_max")?,
            },
            trick_matrix: get_bool01("trick_matrix")?,
            approx_mode: get_bool01("approx_mode")?,
            orb_rhf: get_bool01("orb_rhf")?,
            optimization: OptimizationSpec {
                iter_max: get_usize("iter_max")?,
                iter_told0p: get_f64("iter_told0p")?,
                iter_told1p: get_f64("iter_told1p")?,
                iter_told2p: get_f64("iter_told2p")?,
                nu_electrons: get_usize("nu_electrons")?,
            },
            remesh: RemeshSizeSpec {
                hmin_iso: get_f64("hmin_iso")?,
                hmax_iso: get_f64("hmax_iso")?,
                hmin_met: get_f64("hmin_met")?,
                hmax_met: get_f64("hmax_met")?,
                hmin_ls: get_f64("hmin_ls")?,
                hmax_ls: get_f64("hmax_ls")?,
                hmin_lag: get_f64("hmin_lag")?,
                hmax_lag: get_f64("hmax_lag")?,
                hausd_iso: get_f64("hausd_iso")?,
                hausd_met: get_f64("hausd_met")?,
                hausd_ls: get_f64("hausd_ls")?,
                hausd_lag: get_f64("hausd_lag")?,
                hgrad_iso: get_f64("hgrad_iso")?,
                hgrad_met: get_f64("hgrad_met")?,
                hgrad_ls: get_f64("hgrad_ls")?,
                hgrad_lag: get_f64("hgrad_lag")?,
                hmode_lag,
            },
            advection: AdvectionSpec {
                n_iter: get_usize("n_iter")?,
                residual: get_f64("residual")?,
                delta_t: get_f64("delta_t")?,
                no_cfl: get_bool01("no_cfl")?,
            },
            save: SaveSpec {
                save_type: get_usize("save_type")? as u8,
                save_mesh: get("save_mesh")?,
                save_data: get("save_data")?,
                save_print: get_usize("save_print")? as u32,
                save_where: get_usize("save_where")? as u8,
            },
            tools: ToolPaths {
                path_medit: get("path_medit")?,
                path_mmg3d: get("path_mmg3d")?,
                path_mshdist: get("path_mshdist")?,
                path_elastic: get("path_elastic")?,
                path_advect: get("path_advect")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> String {
        r#"
        opt_mode 0
        verbose 1
        n_cpu 1
        name_length 64
        x_min -4 y_min -4 z_min -4
        x_max 4 y_max 4 z_max 4
        n_x 5 n_y 5 n_z 5
        ls_type 1
        ls_x 0 ls_y 0 ls_z 0
        ls_r 1
        met_err 0.1
        met_min 0.01
        met_max 1.0
        trick_matrix 0
        approx_mode 0
        orb_rhf 1
        iter_max 10
        iter_told0p 1e-3
        iter_told1p 1e-3
        iter_told2p 1e-3
        nu_electrons 1
        hmin_iso 0.01 hmax_iso 1.0
        hmin_met 0.01 hmax_met 1.0
        hmin_ls 0.01 hmax_ls 1.0
        hmin_lag 0.01 hmax_lag 1.0
        hausd_iso 0.01 hausd_met 0.01 hausd_ls 0.01 hausd_lag 0.01
        hgrad_iso 1.3 hgrad_met 1.3 hgrad_ls 1.3 hgrad_lag 1.3
        hmode_lag 0
        n_iter 10
        residual 1e-6
        delta_t 0.01
        no_cfl 0
        save_type 0
        save_mesh out
        save_data out
        save_print 0
        save_where 0
        path_medit /usr/bin/medit
        path_mmg3d /usr/bin/mmg3d
        path_mshdist /usr/bin/mshdist
        path_elastic /usr/bin/elastic
        path_advect /usr/bin/advect
        "#
        .to_string()
    }

    #[test]
    fn parses_and_validates_sample_config() {
        let cfg = Config::from_info_str(&sample_info()).unwrap();
        assert!(cfg.opt_mode.is_hex());
        cfg.validate(1).unwrap();
    }

    #[test]
    fn rejects_inverted_box_bounds() {
        let mut text = sample_info();
        text = text.replace("x_max 4", "x_max -5");
        let cfg = Config::from_info_str(&text).unwrap();
        assert!(cfg.validate(1).is_err());
    }

    #[test]
    fn rejects_out_of_range_nu_electrons() {
        let cfg = Config::from_info_str(&sample_info()).unwrap();
        assert_eq!(cfg.optimization.nu_electrons, 1);
        // nu_electrons=1 with nmorb=0 means the valid range [1,0] is empty.
        assert!(cfg.validate(0).is_err());
    }
}
